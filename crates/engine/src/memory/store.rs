//! Document storage behind the in-memory client
//!
//! Committed documents live in a `DashMap` keyed by collection name.
//! Transactional writes are buffered per session in `pending` and only
//! become visible to other sessions when the transaction commits.
//!
//! # Commit
//!
//! Commits and non-transactional writes are serialized by `commit_lock`,
//! so validating a write batch and applying it is atomic with respect to
//! other writers. An insert whose id was committed by another session in
//! the meantime fails the whole batch with a `WriteConflict`.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use txscope_core::{Error, Result, SessionId};

/// Server code for a duplicate `_id`
pub const DUPLICATE_KEY: i32 = 11000;
/// Server code for a transaction that lost a write race
pub const WRITE_CONFLICT: i32 = 112;
/// Label marking errors that are safe to retry as a whole transaction
pub const TRANSIENT_TRANSACTION_ERROR: &str = "TransientTransactionError";

/// A buffered write
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WriteOp {
    Insert {
        collection: String,
        id: String,
        doc: Value,
    },
    Replace {
        collection: String,
        id: String,
        doc: Value,
    },
    Delete {
        collection: String,
        id: String,
    },
}

impl WriteOp {
    fn target(&self) -> (&str, &str) {
        match self {
            WriteOp::Insert { collection, id, .. }
            | WriteOp::Replace { collection, id, .. }
            | WriteOp::Delete { collection, id } => (collection, id),
        }
    }

    /// Visible document after this op, for the op's target
    fn effect(&self) -> Option<&Value> {
        match self {
            WriteOp::Insert { doc, .. } | WriteOp::Replace { doc, .. } => Some(doc),
            WriteOp::Delete { .. } => None,
        }
    }
}

fn duplicate_key(collection: &str, id: &str) -> Error {
    Error::server(
        DUPLICATE_KEY,
        "DuplicateKey",
        format!("E11000 duplicate key error collection: {collection} dup key: {{ _id: \"{id}\" }}"),
    )
}

fn write_conflict(collection: &str, id: &str) -> Error {
    Error::server(
        WRITE_CONFLICT,
        "WriteConflict",
        format!("write conflict on {collection}/{id} during commit"),
    )
    .with_label(TRANSIENT_TRANSACTION_ERROR)
}

#[derive(Debug, Default)]
pub(crate) struct DocumentStore {
    collections: DashMap<String, HashMap<String, Value>>,
    pending: DashMap<SessionId, Vec<WriteOp>>,
    commit_lock: Mutex<()>,
    version: AtomicU64,
}

impl DocumentStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of commits and direct writes applied so far
    pub(crate) fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn committed(&self, collection: &str, id: &str) -> Option<Value> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned())
    }

    /// Document as seen by `session` (its pending writes over committed state)
    pub(crate) fn read(&self, session: Option<SessionId>, collection: &str, id: &str) -> Option<Value> {
        if let Some(session) = session {
            if let Some(ops) = self.pending.get(&session) {
                if let Some(op) = ops.iter().rev().find(|op| op.target() == (collection, id)) {
                    return op.effect().cloned();
                }
            }
        }
        self.committed(collection, id)
    }

    pub(crate) fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    /// Open an empty write buffer for `session`
    pub(crate) fn begin(&self, session: SessionId) {
        self.pending.insert(session, Vec::new());
    }

    /// Drop the write buffer of `session`, returning how many ops it held
    pub(crate) fn discard(&self, session: SessionId) -> usize {
        self.pending
            .remove(&session)
            .map(|(_, ops)| ops.len())
            .unwrap_or(0)
    }

    /// Buffer `op` for `session`, validating it against the session's view
    pub(crate) fn buffer(&self, session: SessionId, op: WriteOp) -> Result<()> {
        let (collection, id) = op.target();
        if matches!(op, WriteOp::Insert { .. }) && self.read(Some(session), collection, id).is_some() {
            return Err(duplicate_key(collection, id));
        }
        match self.pending.get_mut(&session) {
            Some(mut ops) => {
                ops.push(op);
                Ok(())
            }
            None => Err(Error::Session(format!(
                "session {session} has no open transaction"
            ))),
        }
    }

    /// Apply the buffered writes of `session` atomically
    ///
    /// On conflict nothing is applied and the buffer is dropped.
    pub(crate) fn commit(&self, session: SessionId) -> Result<usize> {
        let ops = self
            .pending
            .remove(&session)
            .map(|(_, ops)| ops)
            .unwrap_or_default();

        let _guard = self.commit_lock.lock();
        self.validate(&ops)?;
        let applied = ops.len();
        for op in ops {
            self.apply(op);
        }
        self.version.fetch_add(1, Ordering::AcqRel);
        Ok(applied)
    }

    /// Apply a single write outside any transaction
    pub(crate) fn write_direct(&self, op: WriteOp) -> Result<()> {
        let _guard = self.commit_lock.lock();
        let (collection, id) = op.target();
        if matches!(op, WriteOp::Insert { .. }) && self.committed(collection, id).is_some() {
            return Err(duplicate_key(collection, id));
        }
        self.apply(op);
        self.version.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Replay `ops` against committed state; inserts must not collide
    fn validate(&self, ops: &[WriteOp]) -> Result<()> {
        let mut overlay: HashMap<(&str, &str), bool> = HashMap::new();
        for op in ops {
            let target = op.target();
            let exists = match overlay.get(&target) {
                Some(exists) => *exists,
                None => self.committed(target.0, target.1).is_some(),
            };
            if matches!(op, WriteOp::Insert { .. }) && exists {
                return Err(write_conflict(target.0, target.1));
            }
            overlay.insert(target, op.effect().is_some());
        }
        Ok(())
    }

    fn apply(&self, op: WriteOp) {
        match op {
            WriteOp::Insert { collection, id, doc } | WriteOp::Replace { collection, id, doc } => {
                self.collections.entry(collection).or_default().insert(id, doc);
            }
            WriteOp::Delete { collection, id } => {
                if let Some(mut docs) = self.collections.get_mut(&collection) {
                    docs.remove(&id);
                }
            }
        }
    }
}
