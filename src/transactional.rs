//! Transactional scopes
//!
//! [`Transactional`] attaches the transaction coordinator to a closure or
//! function. Its configuration is resolved once, when the scope is built;
//! every call afterwards reuses it.
//!
//! ```ignore
//! use txscope::prelude::*;
//!
//! // Default connection, no options
//! let scope = Transactional::new(());
//! scope
//!     .run(|| async {
//!         let session = current_session();
//!         db.insert_one(session.as_ref(), "ledger", "t1", json!({"amount": 10}))?;
//!         Ok::<_, Error>(())
//!     })
//!     .await?;
//!
//! // Named connection; the receiver travels in the argument tuple
//! let transfer = Transactional::new("secondary")
//!     .wrap(|(ledger, amount): (Arc<Ledger>, i64)| async move {
//!         ledger.transfer(amount).await
//!     });
//! transfer.call((Arc::clone(&ledger), 10)).await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use tracing::debug;
use txscope_concurrency::{TransactionCoordinator, TransactionMetrics};
use txscope_core::{
    ConnectionResolver, Error as CoreError, ErrorClassification, TransactionConfig,
    TransactionalArgs,
};
use txscope_engine::ConnectionRegistry;

/// A transactional scope
///
/// Cloning is cheap; clones share configuration and metrics.
#[derive(Debug, Clone)]
pub struct Transactional {
    coordinator: Arc<TransactionCoordinator>,
}

impl Transactional {
    /// Build a scope that resolves connections from the process-wide registry
    ///
    /// Accepts `()`, a connection name, [`SessionOptions`], or a
    /// `(name, SessionOptions)` pair.
    ///
    /// [`SessionOptions`]: txscope_core::SessionOptions
    pub fn new(args: impl Into<TransactionalArgs>) -> Self {
        Self::with_resolver(args, ConnectionRegistry::global())
    }

    /// Build a scope that resolves connections from `resolver`
    pub fn with_resolver<R>(args: impl Into<TransactionalArgs>, resolver: Arc<R>) -> Self
    where
        R: ConnectionResolver + 'static,
    {
        let config = TransactionConfig::resolve(args);
        debug!(
            connection = %config.connection_name,
            has_options = config.session_options.is_some(),
            "transactional scope configured"
        );
        Self {
            coordinator: Arc::new(TransactionCoordinator::new(config, resolver)),
        }
    }

    /// The resolved configuration
    pub fn config(&self) -> &TransactionConfig {
        self.coordinator.config()
    }

    /// Counters for sessions started, joined and finalized by this scope
    pub fn metrics(&self) -> TransactionMetrics {
        self.coordinator.metrics()
    }

    /// Run `body` inside a transaction
    ///
    /// Joins the transaction of the enclosing scope when there is one;
    /// otherwise starts, commits or aborts, and ends a session of its own.
    pub async fn run<T, E, F, Fut>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CoreError> + ErrorClassification,
    {
        self.coordinator.execute(body).await
    }

    /// Attach this scope to `f`
    ///
    /// The returned [`TransactionalFn`] takes the same single argument as
    /// `f` (use a tuple for several, and include the receiver to keep a
    /// method's `self` binding) and returns the same result.
    pub fn wrap<F>(&self, f: F) -> TransactionalFn<F> {
        TransactionalFn {
            scope: self.clone(),
            f,
        }
    }
}

/// A function bound to a transactional scope
#[derive(Debug, Clone)]
pub struct TransactionalFn<F> {
    scope: Transactional,
    f: F,
}

impl<F> TransactionalFn<F> {
    /// Invoke the wrapped function inside the scope
    pub async fn call<A, T, E, Fut>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CoreError> + ErrorClassification,
    {
        self.scope.run(|| (self.f)(args)).await
    }

    /// The scope this function runs in
    pub fn scope(&self) -> &Transactional {
        &self.scope
    }
}
