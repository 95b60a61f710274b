//! Convenient imports for txscope.
//!
//! This module re-exports the most commonly used types so you can get started
//! with a single import:
//!
//! ```ignore
//! use txscope::prelude::*;
//!
//! let scope = Transactional::new("secondary");
//! ```

// Main entry point
pub use crate::transactional::{Transactional, TransactionalFn};

// Error handling
pub use crate::error::{ConnectionNotExistError, Error, Result};

// Context access
pub use txscope_concurrency::{current_session, inherit};

// Configuration
pub use txscope_core::{
    ReadConcern, ReadPreference, SessionOptions, TransactionOptions, WriteConcern,
    DEFAULT_CONNECTION_NAME,
};

// Connections
pub use txscope_core::{Connection, Session, SessionHandle};
pub use txscope_engine::{ConnectionRegistry, MemoryClient};

// Shared ownership for registered connections
pub use std::sync::Arc;
