//! Connections for txscope
//!
//! This crate provides the collaborators the coordinator resolves at
//! run time:
//! - ConnectionRegistry: named connections, process-wide or per instance
//! - MemoryClient: an in-memory document store with session-based
//!   transactions and an inspectable session journal

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod registry;

pub use memory::{
    JournalSnapshot, MemoryClient, MemorySession, SessionEvent, DUPLICATE_KEY,
    TRANSIENT_TRANSACTION_ERROR, WRITE_CONFLICT,
};
pub use registry::ConnectionRegistry;
