//! Error types shared by every txscope crate
//!
//! The coordinator raises exactly one error of its own
//! ([`Error::ConnectionNotExist`]); everything else is produced by the
//! session primitives of a driver and passed through unchanged.
//!
//! ## Classification
//!
//! | Variant | Server-reported | Raised by |
//! |---------|-----------------|-----------|
//! | ConnectionNotExist | no | coordinator |
//! | Server | yes | driver (server rejected an operation) |
//! | Session | no | driver (client-side lifecycle misuse) |
//! | NoActiveContext | no | execution context store |
//! | Internal | no | bug or invariant violation |

use thiserror::Error;

/// Result type for txscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Internal error type for txscope
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// No connection is registered under the configured name
    #[error("connection not exist: {name}")]
    ConnectionNotExist {
        /// The name that failed to resolve
        name: String,
    },

    /// The database server rejected an operation
    #[error("server error {code} ({code_name}): {message}")]
    Server {
        /// Numeric server error code (e.g. 11000 for duplicate key)
        code: i32,
        /// Symbolic code name (e.g. "DuplicateKey")
        code_name: String,
        /// Server-provided message
        message: String,
        /// Error labels attached by the server (e.g. "TransientTransactionError")
        labels: Vec<String>,
    },

    /// Client-side session or transaction lifecycle failure
    #[error("session error: {0}")]
    Session(String),

    /// A context write was attempted outside of any execution context
    #[error("no active execution context")]
    NoActiveContext,

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a server-reported error without labels
    pub fn server(code: i32, code_name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Server {
            code,
            code_name: code_name.into(),
            message: message.into(),
            labels: Vec::new(),
        }
    }

    /// Attach an error label to a server-reported error
    ///
    /// Labels on non-server variants are ignored.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        if let Error::Server { labels, .. } = &mut self {
            labels.push(label.into());
        }
        self
    }

    /// Check whether the error originated from the database server
    pub fn is_server_reported(&self) -> bool {
        matches!(self, Error::Server { .. })
    }

    /// Check whether this is an unresolvable connection name
    pub fn is_connection_not_exist(&self) -> bool {
        matches!(self, Error::ConnectionNotExist { .. })
    }

    /// Check whether a server-reported error carries the given label
    pub fn has_label(&self, label: &str) -> bool {
        match self {
            Error::Server { labels, .. } => labels.iter().any(|l| l == label),
            _ => false,
        }
    }
}

/// Predicate used by the coordinator to decide whether to abort
///
/// A server-reported error is left un-aborted when it terminates the
/// wrapped method, so that a secondary abort failure cannot mask it.
/// Application error types implement this to opt into the same rule.
pub trait ErrorClassification {
    /// Returns `true` if the database server itself reported this error
    fn is_server_reported(&self) -> bool;
}

impl ErrorClassification for Error {
    fn is_server_reported(&self) -> bool {
        Error::is_server_reported(self)
    }
}

impl<E: ErrorClassification + ?Sized> ErrorClassification for Box<E> {
    fn is_server_reported(&self) -> bool {
        (**self).is_server_reported()
    }
}
