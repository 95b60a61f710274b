//! Exactly-once session release
//!
//! The owning invocation holds a [`SessionGuard`] from the moment its
//! session exists. The session is ended exactly once: by [`finish`] on the
//! normal path, or by `Drop` when the owning future is cancelled or a
//! finalization step returns early.
//!
//! [`finish`]: SessionGuard::finish

use crate::metrics::CoordinatorMetrics;
use std::sync::Arc;
use tracing::{debug, warn};
use txscope_core::SessionHandle;

/// Ends its session exactly once
pub struct SessionGuard {
    session: Option<SessionHandle>,
    metrics: Arc<CoordinatorMetrics>,
}

impl SessionGuard {
    /// Take ownership of releasing `session`
    pub fn new(session: SessionHandle, metrics: Arc<CoordinatorMetrics>) -> Self {
        Self {
            session: Some(session),
            metrics,
        }
    }

    /// Release the session now
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(session) = self.session.take() {
            session.end_session();
            self.metrics.record_end();
            debug!(session_id = %session.id(), "session ended");
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            warn!(
                session_id = %session.id(),
                state = %session.state(),
                "session released without finalization"
            );
        }
        self.release();
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("session", &self.session.as_ref().map(|s| s.id()))
            .finish()
    }
}
