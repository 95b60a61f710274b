//! Session event journal
//!
//! Every lifecycle transition of a [`MemorySession`] is appended here in
//! order, so callers can assert exactly how many sessions were started,
//! committed, aborted and ended, and in which order.
//!
//! [`MemorySession`]: super::MemorySession

use parking_lot::Mutex;
use txscope_core::{SessionId, SessionOptions};

/// One lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// `start_session` returned a new session
    SessionStarted {
        /// Session identity
        session_id: SessionId,
        /// Options the session was started with
        options: Option<SessionOptions>,
    },
    /// `start_transaction` succeeded
    TransactionStarted {
        /// Session identity
        session_id: SessionId,
    },
    /// `commit_transaction` succeeded
    Committed {
        /// Session identity
        session_id: SessionId,
    },
    /// `abort_transaction` succeeded
    Aborted {
        /// Session identity
        session_id: SessionId,
    },
    /// `end_session` released the session
    Ended {
        /// Session identity
        session_id: SessionId,
        /// Whether an open transaction was discarded by ending
        discarded_transaction: bool,
    },
}

impl SessionEvent {
    /// The session this event belongs to
    pub fn session_id(&self) -> SessionId {
        match self {
            SessionEvent::SessionStarted { session_id, .. }
            | SessionEvent::TransactionStarted { session_id }
            | SessionEvent::Committed { session_id }
            | SessionEvent::Aborted { session_id }
            | SessionEvent::Ended { session_id, .. } => *session_id,
        }
    }

    /// Short name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::SessionStarted { .. } => "session_started",
            SessionEvent::TransactionStarted { .. } => "transaction_started",
            SessionEvent::Committed { .. } => "committed",
            SessionEvent::Aborted { .. } => "aborted",
            SessionEvent::Ended { .. } => "ended",
        }
    }

    /// `true` for [`SessionEvent::SessionStarted`]
    pub fn is_session_started(&self) -> bool {
        matches!(self, SessionEvent::SessionStarted { .. })
    }

    /// `true` for [`SessionEvent::TransactionStarted`]
    pub fn is_transaction_started(&self) -> bool {
        matches!(self, SessionEvent::TransactionStarted { .. })
    }

    /// `true` for [`SessionEvent::Committed`]
    pub fn is_committed(&self) -> bool {
        matches!(self, SessionEvent::Committed { .. })
    }

    /// `true` for [`SessionEvent::Aborted`]
    pub fn is_aborted(&self) -> bool {
        matches!(self, SessionEvent::Aborted { .. })
    }

    /// `true` for [`SessionEvent::Ended`]
    pub fn is_ended(&self) -> bool {
        matches!(self, SessionEvent::Ended { .. })
    }
}

/// Append-only event log shared by a client and its sessions
#[derive(Debug, Default)]
pub(crate) struct Journal {
    events: Mutex<Vec<SessionEvent>>,
}

impl Journal {
    pub(crate) fn record(&self, event: SessionEvent) {
        self.events.lock().push(event);
    }

    pub(crate) fn snapshot(&self) -> JournalSnapshot {
        JournalSnapshot {
            events: self.events.lock().clone(),
        }
    }

    pub(crate) fn clear(&self) {
        self.events.lock().clear();
    }
}

/// Copy of the journal at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalSnapshot {
    events: Vec<SessionEvent>,
}

impl JournalSnapshot {
    /// All events in order
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Event kinds in order
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(SessionEvent::kind).collect()
    }

    /// Number of events matching `predicate`
    pub fn count(&self, predicate: impl Fn(&SessionEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }

    /// Events of a single session, in order
    pub fn for_session(&self, session_id: SessionId) -> Vec<SessionEvent> {
        self.events
            .iter()
            .filter(|e| e.session_id() == session_id)
            .cloned()
            .collect()
    }

    /// Distinct sessions in order of first appearance
    pub fn sessions(&self) -> Vec<SessionId> {
        let mut seen = Vec::new();
        for event in &self.events {
            let id = event.session_id();
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
        seen
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
