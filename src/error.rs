//! Unified error types for txscope.
//!
//! This module provides a clean error type that wraps internal errors
//! and presents a consistent interface to users. Application code that has
//! no error type of its own can return [`Error`] from transactional bodies
//! and wrap its own failures with [`Error::application`].

use thiserror::Error;
use txscope_core::ErrorClassification;

/// No connection is registered under the requested name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("connection not exist: {name}")]
pub struct ConnectionNotExistError {
    /// The name that failed to resolve
    pub name: String,
}

/// All txscope errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured connection name is not registered
    #[error(transparent)]
    ConnectionNotExist(#[from] ConnectionNotExistError),

    /// The database server rejected an operation
    #[error("server error {code} ({code_name}): {message}")]
    Server {
        /// Numeric server error code
        code: i32,
        /// Symbolic code name
        code_name: String,
        /// Server-provided message
        message: String,
        /// Error labels attached by the server
        labels: Vec<String>,
    },

    /// Client-side session or transaction failure
    #[error("session error: {0}")]
    Session(String),

    /// Failure raised by the wrapped application code
    #[error("application error: {0}")]
    Application(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for txscope operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an application failure.
    pub fn application(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Application(e.into())
    }

    /// Check if this is an unresolvable connection name.
    pub fn is_connection_not_exist(&self) -> bool {
        matches!(self, Error::ConnectionNotExist(_))
    }

    /// Check if the database server reported this error.
    pub fn is_server_reported(&self) -> bool {
        matches!(self, Error::Server { .. })
    }

    /// Check if this error is retryable.
    ///
    /// Server errors labelled `TransientTransactionError` may succeed if the
    /// whole transaction is run again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Server { labels, .. } => labels
                .iter()
                .any(|l| l == txscope_engine::TRANSIENT_TRANSACTION_ERROR),
            _ => false,
        }
    }
}

impl ErrorClassification for Error {
    fn is_server_reported(&self) -> bool {
        Error::is_server_reported(self)
    }
}

// Convert from internal core errors
impl From<txscope_core::Error> for Error {
    fn from(e: txscope_core::Error) -> Self {
        use txscope_core::Error as CoreError;
        match e {
            CoreError::ConnectionNotExist { name } => {
                Error::ConnectionNotExist(ConnectionNotExistError { name })
            }
            CoreError::Server {
                code,
                code_name,
                message,
                labels,
            } => Error::Server {
                code,
                code_name,
                message,
                labels,
            },
            CoreError::Session(msg) => Error::Session(msg),
            CoreError::NoActiveContext => {
                Error::Internal("no active execution context".to_string())
            }
            CoreError::Internal(msg) => Error::Internal(msg),
        }
    }
}
