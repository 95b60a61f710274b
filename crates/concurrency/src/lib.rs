//! Concurrency layer for txscope
//!
//! This crate implements transaction propagation across a call tree:
//! - Execution context store: task-local, per-call-tree storage cell
//! - TransactionCoordinator: join-or-create, run, finalize
//! - SessionGuard: exactly-once session release, including on cancellation
//! - CoordinatorMetrics: start/join/commit/abort/end counters

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod coordinator;
pub mod guard;
pub mod metrics;

pub use context::{
    current_context_exists, current_session, inherit, run_in_new_context, ContextKey,
    ExecutionContext, TRANSACTION_SESSION,
};
pub use coordinator::TransactionCoordinator;
pub use guard::SessionGuard;
pub use metrics::{CoordinatorMetrics, TransactionMetrics};
