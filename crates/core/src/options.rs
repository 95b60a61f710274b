//! Session and transaction options
//!
//! Options are plain data handed to [`Connection::start_session`] unchanged.
//! Field names serialize in camelCase so they round-trip with driver-style
//! JSON such as `{"defaultTransactionOptions": {"readPreference": "primary"}}`.
//!
//! [`Connection::start_session`]: crate::traits::Connection::start_session

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Read preference for operations inside a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadPreference {
    /// Read from the primary only
    Primary,
    /// Prefer the primary, fall back to secondaries
    PrimaryPreferred,
    /// Read from secondaries only
    Secondary,
    /// Prefer secondaries, fall back to the primary
    SecondaryPreferred,
    /// Read from the member with the lowest latency
    Nearest,
}

/// Read concern level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadConcern {
    /// Most recent data on the queried member
    Local,
    /// Data acknowledged by a majority of members
    Majority,
    /// Point-in-time snapshot
    Snapshot,
}

/// Write acknowledgement requirement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteConcern {
    /// `"majority"` or a member count
    pub w: Acknowledgment,
    /// Require the write to reach the on-disk journal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<bool>,
}

/// Write acknowledgement target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Acknowledgment {
    /// Acknowledged by this many members
    Nodes(u32),
    /// Acknowledged by a named tag set (e.g. `"majority"`)
    Custom(String),
}

impl WriteConcern {
    /// Majority write concern
    pub fn majority() -> Self {
        Self {
            w: Acknowledgment::Custom("majority".to_string()),
            journal: None,
        }
    }

    /// Require acknowledgement from `n` members
    pub fn nodes(n: u32) -> Self {
        Self {
            w: Acknowledgment::Nodes(n),
            journal: None,
        }
    }
}

/// Defaults applied to every transaction started on a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOptions {
    /// Read concern for reads inside the transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_concern: Option<ReadConcern>,
    /// Write concern for the commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_concern: Option<WriteConcern>,
    /// Read preference for reads inside the transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_preference: Option<ReadPreference>,
    /// Upper bound on the server-side commit time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_commit_time: Option<Duration>,
}

impl TransactionOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the read concern
    pub fn read_concern(mut self, level: ReadConcern) -> Self {
        self.read_concern = Some(level);
        self
    }

    /// Set the write concern
    pub fn write_concern(mut self, concern: WriteConcern) -> Self {
        self.write_concern = Some(concern);
        self
    }

    /// Set the read preference
    pub fn read_preference(mut self, preference: ReadPreference) -> Self {
        self.read_preference = Some(preference);
        self
    }

    /// Set the maximum commit time
    pub fn max_commit_time(mut self, timeout: Duration) -> Self {
        self.max_commit_time = Some(timeout);
        self
    }
}

/// Options passed to [`Connection::start_session`]
///
/// Use the builder pattern to configure options:
///
/// ```
/// use txscope_core::options::{ReadPreference, SessionOptions};
///
/// let opts = SessionOptions::new()
///     .causal_consistency(true)
///     .read_preference(ReadPreference::Primary);
/// assert_eq!(opts.read_preference_or_default(), ReadPreference::Primary);
/// ```
///
/// [`Connection::start_session`]: crate::traits::Connection::start_session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    /// Causally consistent reads within the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causal_consistency: Option<bool>,
    /// Snapshot reads within the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<bool>,
    /// Defaults for every transaction started on the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_transaction_options: Option<TransactionOptions>,
}

impl SessionOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable causal consistency
    pub fn causal_consistency(mut self, enabled: bool) -> Self {
        self.causal_consistency = Some(enabled);
        self
    }

    /// Enable or disable snapshot reads
    pub fn snapshot(mut self, enabled: bool) -> Self {
        self.snapshot = Some(enabled);
        self
    }

    /// Set the defaults for transactions on this session
    pub fn default_transaction_options(mut self, options: TransactionOptions) -> Self {
        self.default_transaction_options = Some(options);
        self
    }

    /// Shorthand for setting the read preference of the default transaction options
    pub fn read_preference(mut self, preference: ReadPreference) -> Self {
        let txn = self.default_transaction_options.take().unwrap_or_default();
        self.default_transaction_options = Some(txn.read_preference(preference));
        self
    }

    /// Effective read preference (primary when unset)
    pub fn read_preference_or_default(&self) -> ReadPreference {
        self.default_transaction_options
            .as_ref()
            .and_then(|t| t.read_preference)
            .unwrap_or(ReadPreference::Primary)
    }
}
