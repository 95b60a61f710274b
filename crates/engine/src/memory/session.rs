//! Sessions of the in-memory client

use super::journal::{Journal, SessionEvent};
use super::store::DocumentStore;
use super::Faults;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;
use txscope_core::{Error, Result, Session, SessionId, SessionOptions, SessionState};

/// A session on a [`MemoryClient`](super::MemoryClient)
pub struct MemorySession {
    id: SessionId,
    options: Option<SessionOptions>,
    state: Mutex<SessionState>,
    store: Arc<DocumentStore>,
    journal: Arc<Journal>,
    faults: Arc<Faults>,
}

impl MemorySession {
    pub(crate) fn new(
        options: Option<SessionOptions>,
        store: Arc<DocumentStore>,
        journal: Arc<Journal>,
        faults: Arc<Faults>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            options,
            state: Mutex::new(SessionState::NotStarted),
            store,
            journal,
            faults,
        }
    }

    /// Options the session was started with
    pub fn options(&self) -> Option<&SessionOptions> {
        self.options.as_ref()
    }

    fn require_active(&self, state: SessionState, operation: &str) -> Result<()> {
        if state.is_active() {
            Ok(())
        } else {
            Err(Error::Session(format!(
                "cannot {operation}: no transaction in progress (state: {state})"
            )))
        }
    }
}

#[async_trait]
impl Session for MemorySession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn state(&self) -> SessionState {
        *self.state.lock()
    }

    fn start_transaction(&self) -> Result<()> {
        let mut state = self.state.lock();
        if !state.can_start_transaction() {
            return Err(Error::Session(format!(
                "cannot start transaction in state {}",
                *state
            )));
        }
        if let Some(e) = self.faults.start.lock().take() {
            return Err(e);
        }
        self.store.begin(self.id);
        *state = SessionState::Active;
        self.journal
            .record(SessionEvent::TransactionStarted { session_id: self.id });
        Ok(())
    }

    async fn commit_transaction(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.require_active(*state, "commit")?;
        if let Some(e) = self.faults.commit.lock().take() {
            return Err(e);
        }
        match self.store.commit(self.id) {
            Ok(applied) => {
                *state = SessionState::Committed;
                self.journal
                    .record(SessionEvent::Committed { session_id: self.id });
                debug!(session_id = %self.id, applied, "memory transaction committed");
                Ok(())
            }
            Err(e) => {
                *state = SessionState::Aborted;
                Err(e)
            }
        }
    }

    async fn abort_transaction(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.require_active(*state, "abort")?;
        if let Some(e) = self.faults.abort.lock().take() {
            return Err(e);
        }
        let discarded = self.store.discard(self.id);
        *state = SessionState::Aborted;
        self.journal
            .record(SessionEvent::Aborted { session_id: self.id });
        debug!(session_id = %self.id, discarded, "memory transaction aborted");
        Ok(())
    }

    fn end_session(&self) {
        let mut state = self.state.lock();
        if state.is_ended() {
            return;
        }
        let discarded_transaction = state.is_active();
        if discarded_transaction {
            self.store.discard(self.id);
        }
        *state = SessionState::Ended;
        self.journal.record(SessionEvent::Ended {
            session_id: self.id,
            discarded_transaction,
        });
    }
}

impl std::fmt::Debug for MemorySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySession")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
