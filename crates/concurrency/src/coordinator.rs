//! Transaction coordinator
//!
//! Decides, per invocation of a transactional scope, whether to join the
//! session already present in the call tree or to create one, runs the
//! wrapped body, and finalizes the session according to its outcome.
//!
//! ## Invocation state machine
//!
//! ```text
//! NO_CONTEXT ─┬─ session in context ──▶ JOIN ───▶ RUNNING ──▶ (result passthrough)
//!             └─ otherwise ─▶ new context ─▶ CREATE ─▶ RUNNING ─┬─▶ COMMITTED ─┐
//!                                                               └─▶ ABORTED  ──┴─▶ ENDED
//! ```
//!
//! ## Ownership
//!
//! Only the invocation that started the session commits, aborts and ends
//! it. Joiners use the session through the context and never finalize it,
//! so a call tree of any depth performs exactly one start and exactly one
//! terminal commit-or-abort followed by one end.
//!
//! ## Failure handling
//!
//! | Body outcome | Owner action |
//! |--------------|--------------|
//! | `Ok(v)` | commit, end, return `v` |
//! | `Err(e)`, not server-reported | abort, end, return `e` |
//! | `Err(e)`, server-reported | end (no abort), return `e` |
//!
//! A failing commit or abort replaces the body's result with that failure;
//! the session is ended regardless. A failed commit goes through the same
//! abort rule: client-side failures are aborted, server-reported ones are
//! not. If that abort fails too, its error is returned instead.

use crate::context::{self, TRANSACTION_SESSION};
use crate::guard::SessionGuard;
use crate::metrics::{CoordinatorMetrics, TransactionMetrics};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, debug_span, warn, Instrument};
use txscope_core::{
    ConnectionResolver, Error, ErrorClassification, SessionHandle, TransactionConfig,
};

/// Finalization chosen from the body's outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finalize {
    Commit,
    Abort,
    SkipAbort,
}

/// Runs transactional scopes against connections from a resolver
pub struct TransactionCoordinator {
    config: TransactionConfig,
    resolver: Arc<dyn ConnectionResolver>,
    metrics: Arc<CoordinatorMetrics>,
}

impl TransactionCoordinator {
    /// Create a coordinator for a resolved configuration
    pub fn new(config: TransactionConfig, resolver: Arc<dyn ConnectionResolver>) -> Self {
        Self {
            config,
            resolver,
            metrics: Arc::new(CoordinatorMetrics::new()),
        }
    }

    /// The configuration this coordinator was built with
    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    /// Snapshot of this coordinator's counters
    pub fn metrics(&self) -> TransactionMetrics {
        self.metrics.snapshot()
    }

    /// Run `body` inside a transaction
    ///
    /// Joins the call tree's session when one exists; otherwise opens a new
    /// context, starts a session on the configured connection and owns it.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionNotExist`] (converted into `E`) when the
    ///   configured connection is not registered; no session is touched.
    /// - The body's own error, unchanged.
    /// - Session primitive failures (start, commit, abort), converted into `E`.
    pub async fn execute<T, E, F, Fut>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<Error> + ErrorClassification,
    {
        if let Some(session) = context::current_session() {
            self.metrics.record_join();
            debug!(session_id = %session.id(), "joining active transaction");
            return body().await;
        }

        let span = debug_span!("transaction", connection = %self.config.connection_name);
        context::run_in_new_context(self.execute_in_context(body).instrument(span)).await
    }

    async fn execute_in_context<T, E, F, Fut>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<Error> + ErrorClassification,
    {
        let name = &self.config.connection_name;
        let connection = self
            .resolver
            .get_connection(name)
            .ok_or_else(|| Error::ConnectionNotExist { name: name.clone() })?;

        let guard = match context::current_session() {
            // Unreachable through `execute`: a fresh context starts empty
            Some(session) => {
                self.metrics.record_join();
                debug!(session_id = %session.id(), "joining session placed in fresh context");
                None
            }
            None => {
                let session = connection
                    .start_session(self.config.session_options.as_ref())
                    .await?;
                let guard = SessionGuard::new(session.clone(), Arc::clone(&self.metrics));
                self.metrics.record_start();
                context::set(&TRANSACTION_SESSION, session.clone())?;
                session.start_transaction()?;
                debug!(session_id = %session.id(), "transaction started");
                Some((session, guard))
            }
        };

        let outcome = body().await;

        let Some((session, guard)) = guard else {
            return outcome;
        };

        let action = match &outcome {
            Ok(_) => Finalize::Commit,
            Err(e) if e.is_server_reported() => Finalize::SkipAbort,
            Err(_) => Finalize::Abort,
        };
        let finalized = self.finalize(&session, action).await;
        guard.finish();
        finalized?;
        outcome
    }

    async fn finalize(&self, session: &SessionHandle, action: Finalize) -> Result<(), Error> {
        let session_id = session.id();
        match action {
            Finalize::Commit => {
                if let Err(e) = session.commit_transaction().await {
                    warn!(%session_id, error = %e, "commit failed");
                    if e.is_server_reported() {
                        self.skip_abort(session);
                    } else {
                        self.abort(session).await?;
                    }
                    return Err(e);
                }
                self.metrics.record_commit();
                debug!(%session_id, "transaction committed");
            }
            Finalize::Abort => self.abort(session).await?,
            Finalize::SkipAbort => self.skip_abort(session),
        }
        Ok(())
    }

    async fn abort(&self, session: &SessionHandle) -> Result<(), Error> {
        let session_id = session.id();
        if let Err(e) = session.abort_transaction().await {
            warn!(%session_id, error = %e, "abort failed");
            return Err(e);
        }
        self.metrics.record_abort();
        debug!(%session_id, "transaction aborted");
        Ok(())
    }

    fn skip_abort(&self, session: &SessionHandle) {
        self.metrics.record_abort_skipped();
        warn!(session_id = %session.id(), "server-reported error, leaving transaction un-aborted");
    }
}

impl std::fmt::Debug for TransactionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionCoordinator")
            .field("config", &self.config)
            .finish()
    }
}
