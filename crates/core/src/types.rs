//! Core types for txscope
//!
//! This module defines the fundamental types used throughout the system:
//! - [`SessionId`]: Unique identifier for a database session
//! - [`SessionState`]: Lifecycle state of a session and its transaction
//! - [`DEFAULT_CONNECTION_NAME`]: Connection used when none is configured

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the connection used when a transactional scope names none
pub const DEFAULT_CONNECTION_NAME: &str = "default";

/// Unique identifier for a session
///
/// SessionId is used to:
/// - Correlate journal entries and log events with a session
/// - Key buffered transactional writes inside a driver
/// - Check in tests that nested calls observed the same session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random SessionId using UUID v4
    ///
    /// # Examples
    ///
    /// ```
    /// use txscope_core::types::SessionId;
    ///
    /// let id1 = SessionId::new();
    /// let id2 = SessionId::new();
    /// assert_ne!(id1, id2);
    /// ```
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a session
///
/// ```text
/// NotStarted ──start──▶ Active ──commit──▶ Committed ─┐
///      │                  │                            ├──end──▶ Ended
///      │                  └───abort───▶ Aborted ──────┘
///      └──────────────────────end──────────────────────────────▶ Ended
/// ```
///
/// Ending a session whose transaction is still `Active` discards the
/// transaction, which is how a cancelled call tree releases its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Session exists, no transaction started yet
    NotStarted,
    /// Transaction in progress
    Active,
    /// Transaction committed
    Committed,
    /// Transaction aborted
    Aborted,
    /// Session released; no further operations allowed
    Ended,
}

impl SessionState {
    /// Check whether a transaction is currently open
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active)
    }

    /// Check whether the session has been released
    pub fn is_ended(&self) -> bool {
        matches!(self, SessionState::Ended)
    }

    /// Check whether a new transaction may be started from this state
    pub fn can_start_transaction(&self) -> bool {
        matches!(
            self,
            SessionState::NotStarted | SessionState::Committed | SessionState::Aborted
        )
    }

    /// Name used in log fields and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::NotStarted => "not_started",
            SessionState::Active => "active",
            SessionState::Committed => "committed",
            SessionState::Aborted => "aborted",
            SessionState::Ended => "ended",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
