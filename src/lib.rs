//! # txscope
//!
//! Declarative transaction demarcation for session-based document stores.
//!
//! A transactional scope opens a session before its body runs, commits it
//! when the body succeeds, aborts it when the body fails, and always ends
//! it. Scopes entered from inside another scope join the outer session
//! instead of opening their own, so a whole call tree commits or aborts as
//! one transaction.
//!
//! ## Quick Start
//!
//! ```ignore
//! use txscope::prelude::*;
//!
//! // Register a connection under the default name
//! let db = Arc::new(MemoryClient::new());
//! ConnectionRegistry::global().register_default(db.clone());
//!
//! let scope = Transactional::new(());
//! scope
//!     .run(|| async {
//!         let session = current_session();
//!         db.insert_one(session.as_ref(), "users", "u1", json!({"name": "Alice"}))?;
//!         Ok::<_, Error>(())
//!     })
//!     .await?;
//! ```
//!
//! ## Configuration
//!
//! [`Transactional::new`] takes one of:
//!
//! 1. `()` - default connection, no session options
//! 2. `"name"` - named connection
//! 3. `SessionOptions` - default connection with options
//! 4. `("name", SessionOptions)` - both
//!
//! ## Errors
//!
//! The body's error is returned unchanged. An unregistered connection name
//! fails with [`ConnectionNotExistError`] before any session is started.
//! Errors the database server reported are not followed by an abort, so
//! the original failure is never masked.

#![warn(missing_docs)]

mod error;
mod transactional;

pub mod prelude;

// Re-export main entry points
pub use error::{ConnectionNotExistError, Error, Result};
pub use transactional::{Transactional, TransactionalFn};

// Re-export context access
pub use txscope_concurrency::{
    current_context_exists, current_session, inherit, TransactionMetrics,
};

// Re-export types
pub use txscope_core::{
    Connection, ConnectionResolver, ErrorClassification, ReadConcern, ReadPreference, Session,
    SessionHandle, SessionId, SessionOptions, SessionState, TransactionConfig,
    TransactionOptions, TransactionalArgs, WriteConcern, DEFAULT_CONNECTION_NAME,
};

// Re-export connections
pub use txscope_engine::{ConnectionRegistry, MemoryClient, MemorySession, SessionEvent};
