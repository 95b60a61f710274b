//! Core types and traits for txscope
//!
//! This crate defines the foundational pieces shared by every layer:
//! - SessionId / SessionState: session identity and lifecycle
//! - SessionOptions: options handed to the driver when a session starts
//! - TransactionalArgs / TransactionConfig: scope configuration shapes
//! - Connection / Session / ConnectionResolver: driver collaborator traits
//! - Error / ErrorClassification: error taxonomy and the abort predicate

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod options;
pub mod traits;
pub mod types;

pub use config::{TransactionConfig, TransactionalArgs};
pub use error::{Error, ErrorClassification, Result};
pub use options::{
    Acknowledgment, ReadConcern, ReadPreference, SessionOptions, TransactionOptions, WriteConcern,
};
pub use traits::{Connection, ConnectionResolver, Session, SessionHandle};
pub use types::{SessionId, SessionState, DEFAULT_CONNECTION_NAME};
