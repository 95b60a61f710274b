//! Execution context store
//!
//! A per-call-tree storage cell. Values written inside
//! [`run_in_new_context`] are visible to everything the wrapped future
//! awaits, across suspension points, and invisible to any other task or
//! to sibling futures interleaved on the same thread.
//!
//! The cell is a tokio task-local, so isolation is a property of the
//! scoping mechanism: there is one process-wide key, and each call tree
//! gets its own [`ExecutionContext`] value bound to it for the dynamic
//! extent of its future.
//!
//! ## Spawned work
//!
//! `tokio::spawn` starts a fresh task with no context. Wrap the spawned
//! future in [`inherit`] to carry the caller's context (and therefore its
//! transaction session) into the child task.

use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use txscope_core::{Error, Result, SessionHandle};

tokio::task_local! {
    static CURRENT: Arc<ExecutionContext>;
}

/// Typed key into an [`ExecutionContext`]
pub struct ContextKey<V> {
    name: &'static str,
    _marker: PhantomData<fn() -> V>,
}

impl<V> ContextKey<V> {
    /// Create a key with a process-unique name
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }
}

impl<V> std::fmt::Debug for ContextKey<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ContextKey").field(&self.name).finish()
    }
}

/// Slot holding the active transaction session of a call tree
pub const TRANSACTION_SESSION: ContextKey<SessionHandle> = ContextKey::new("TRANSACTION_SESSION");

/// Storage bound to one call tree
#[derive(Default)]
pub struct ExecutionContext {
    slots: Mutex<HashMap<&'static str, Box<dyn Any + Send + Sync>>>,
}

impl ExecutionContext {
    fn get<V: Clone + 'static>(&self, key: &ContextKey<V>) -> Option<V> {
        self.slots
            .lock()
            .get(key.name)
            .and_then(|slot| slot.downcast_ref::<V>())
            .cloned()
    }

    fn insert<V: Send + Sync + 'static>(&self, key: &ContextKey<V>, value: V) {
        self.slots.lock().insert(key.name, Box::new(value));
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.lock();
        let mut keys: Vec<_> = slots.keys().copied().collect();
        keys.sort_unstable();
        f.debug_struct("ExecutionContext")
            .field("keys", &keys)
            .finish()
    }
}

/// Run `fut` inside a fresh, empty context
///
/// The context lives for as long as `fut` is being polled to completion
/// and is dropped (together with everything stored in it) afterwards.
pub async fn run_in_new_context<F: Future>(fut: F) -> F::Output {
    CURRENT
        .scope(Arc::new(ExecutionContext::default()), fut)
        .await
}

/// Read a value from the current context
///
/// Returns `None` when no context is active or the slot is empty.
pub fn get<V: Clone + 'static>(key: &ContextKey<V>) -> Option<V> {
    CURRENT.try_with(|ctx| ctx.get(key)).ok().flatten()
}

/// Write a value into the current context
///
/// # Errors
///
/// [`Error::NoActiveContext`] when called outside [`run_in_new_context`].
pub fn set<V: Send + Sync + 'static>(key: &ContextKey<V>, value: V) -> Result<()> {
    CURRENT
        .try_with(|ctx| ctx.insert(key, value))
        .map_err(|_| Error::NoActiveContext)
}

/// Check whether the caller runs inside a context
///
/// Distinguishes "no context" from "context with no session".
pub fn current_context_exists() -> bool {
    CURRENT.try_with(|_| ()).is_ok()
}

/// The transaction session of the current call tree, if any
///
/// Method bodies use this to route their database operations through the
/// session opened by the outermost transactional scope.
pub fn current_session() -> Option<SessionHandle> {
    get(&TRANSACTION_SESSION)
}

/// Bind the caller's context to `fut`
///
/// The context is captured when `inherit` is called, not when the
/// returned future is first polled. Outside any context `fut` runs as-is.
pub fn inherit<F: Future>(fut: F) -> impl Future<Output = F::Output> {
    let captured = CURRENT.try_with(Arc::clone).ok();
    async move {
        match captured {
            Some(ctx) => CURRENT.scope(ctx, fut).await,
            None => fut.await,
        }
    }
}
