//! Transactional scope configuration
//!
//! A transactional scope is configured with an optional connection name
//! and optional session options. Rather than sniffing argument types at
//! call time, the caller picks a shape of [`TransactionalArgs`] (usually
//! through one of its `From` impls) and it is resolved exactly once into a
//! [`TransactionConfig`].
//!
//! | Argument | Connection | Options |
//! |----------|------------|---------|
//! | `()` | default | none |
//! | `"secondary"` | `secondary` | none |
//! | `SessionOptions` | default | given |
//! | `("secondary", SessionOptions)` | `secondary` | given |

use crate::options::SessionOptions;
use crate::types::DEFAULT_CONNECTION_NAME;

/// Configuration shapes accepted by a transactional scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransactionalArgs {
    /// Default connection, no session options
    #[default]
    Default,
    /// Named connection, no session options
    ByName(String),
    /// Default connection with session options
    ByOptions(SessionOptions),
    /// Named connection with session options
    ByNameAndOptions(String, SessionOptions),
}

impl TransactionalArgs {
    /// Resolve into the effective configuration
    pub fn resolve(self) -> TransactionConfig {
        match self {
            TransactionalArgs::Default => TransactionConfig::default(),
            TransactionalArgs::ByName(name) => TransactionConfig {
                connection_name: name,
                session_options: None,
            },
            TransactionalArgs::ByOptions(options) => TransactionConfig {
                connection_name: DEFAULT_CONNECTION_NAME.to_string(),
                session_options: Some(options),
            },
            TransactionalArgs::ByNameAndOptions(name, options) => TransactionConfig {
                connection_name: name,
                session_options: Some(options),
            },
        }
    }
}

impl From<()> for TransactionalArgs {
    fn from(_: ()) -> Self {
        TransactionalArgs::Default
    }
}

impl From<&str> for TransactionalArgs {
    fn from(name: &str) -> Self {
        TransactionalArgs::ByName(name.to_string())
    }
}

impl From<String> for TransactionalArgs {
    fn from(name: String) -> Self {
        TransactionalArgs::ByName(name)
    }
}

impl From<SessionOptions> for TransactionalArgs {
    fn from(options: SessionOptions) -> Self {
        TransactionalArgs::ByOptions(options)
    }
}

impl From<(&str, SessionOptions)> for TransactionalArgs {
    fn from((name, options): (&str, SessionOptions)) -> Self {
        TransactionalArgs::ByNameAndOptions(name.to_string(), options)
    }
}

impl From<(String, SessionOptions)> for TransactionalArgs {
    fn from((name, options): (String, SessionOptions)) -> Self {
        TransactionalArgs::ByNameAndOptions(name, options)
    }
}

/// Resolved configuration of a transactional scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionConfig {
    /// Registry name of the connection sessions are started on
    pub connection_name: String,
    /// Options passed to `start_session`, if any
    pub session_options: Option<SessionOptions>,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            connection_name: DEFAULT_CONNECTION_NAME.to_string(),
            session_options: None,
        }
    }
}

impl TransactionConfig {
    /// Resolve any accepted argument shape into a configuration
    pub fn resolve(args: impl Into<TransactionalArgs>) -> Self {
        args.into().resolve()
    }
}
