//! Collaborator traits consumed by the coordinator
//!
//! A driver provides a [`Connection`] that can start [`Session`]s; a
//! [`ConnectionResolver`] maps logical connection names to connections.
//! The coordinator only ever talks to these traits.

use crate::error::Result;
use crate::options::SessionOptions;
use crate::types::{SessionId, SessionState};
use async_trait::async_trait;
use std::sync::Arc;

/// Shared handle to a session
///
/// The owning invocation and every nested invocation in the same call tree
/// hold clones of the same handle. Only the owner finalizes it.
pub type SessionHandle = Arc<dyn Session>;

/// A database-side transaction context
///
/// All methods take `&self`; implementations keep their lifecycle state
/// behind interior mutability so the handle can be shared.
#[async_trait]
pub trait Session: Send + Sync + std::fmt::Debug {
    /// Identity of this session
    fn id(&self) -> SessionId;

    /// Current lifecycle state
    fn state(&self) -> SessionState;

    /// Open a transaction on this session
    fn start_transaction(&self) -> Result<()>;

    /// Commit the open transaction
    async fn commit_transaction(&self) -> Result<()>;

    /// Abort the open transaction
    async fn abort_transaction(&self) -> Result<()>;

    /// Release the session
    ///
    /// Synchronous so it can run from `Drop`. Ending a session with an open
    /// transaction discards that transaction. Must be idempotent.
    fn end_session(&self);
}

/// A live database connection capable of starting sessions
#[async_trait]
pub trait Connection: Send + Sync {
    /// Start a new session
    async fn start_session(&self, options: Option<&SessionOptions>) -> Result<SessionHandle>;
}

/// Resolves a logical connection name to a live connection
pub trait ConnectionResolver: Send + Sync {
    /// Look up a connection by name; `None` if nothing is registered
    fn get_connection(&self, name: &str) -> Option<Arc<dyn Connection>>;
}

impl<R: ConnectionResolver + ?Sized> ConnectionResolver for Arc<R> {
    fn get_connection(&self, name: &str) -> Option<Arc<dyn Connection>> {
        (**self).get_connection(name)
    }
}
