//! In-memory document store
//!
//! A [`Connection`] implementation with real transactional semantics and
//! no network: documents are `serde_json::Value`s keyed by string id in
//! named collections.
//!
//! # Transactions
//!
//! Writes made with a session whose transaction is active are buffered and
//! visible only to that session. Commit applies them atomically; abort, or
//! ending the session with the transaction still open, discards them.
//! Writes with no session (or a session without an active transaction)
//! apply immediately.
//!
//! # Example
//!
//! ```ignore
//! let client = Arc::new(MemoryClient::new());
//! let session = client.start_session(None).await?;
//! session.start_transaction()?;
//! client.insert_one(Some(&session), "users", "u1", json!({"name": "Alice"}))?;
//! session.commit_transaction().await?;
//! session.end_session();
//! ```

mod journal;
mod session;
mod store;

pub use journal::{JournalSnapshot, SessionEvent};
pub use session::MemorySession;
pub use store::{DUPLICATE_KEY, TRANSIENT_TRANSACTION_ERROR, WRITE_CONFLICT};

use async_trait::async_trait;
use journal::Journal;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use store::{DocumentStore, WriteOp};
use tracing::debug;
use txscope_core::{Connection, Error, Result, SessionHandle, SessionId, SessionOptions};

/// Errors queued to be returned by the next start/commit/abort of any session
#[derive(Debug, Default)]
pub(crate) struct Faults {
    pub(crate) start: Mutex<Option<Error>>,
    pub(crate) commit: Mutex<Option<Error>>,
    pub(crate) abort: Mutex<Option<Error>>,
}

/// In-memory connection
#[derive(Debug, Default)]
pub struct MemoryClient {
    store: Arc<DocumentStore>,
    journal: Arc<Journal>,
    faults: Arc<Faults>,
}

impl MemoryClient {
    /// Create an empty client
    pub fn new() -> Self {
        Self {
            store: Arc::new(DocumentStore::new()),
            journal: Arc::new(Journal::default()),
            faults: Arc::new(Faults::default()),
        }
    }

    /// Copy of the session event journal
    pub fn journal(&self) -> JournalSnapshot {
        self.journal.snapshot()
    }

    /// Forget all recorded session events
    pub fn clear_journal(&self) {
        self.journal.clear();
    }

    /// Make the next `start_transaction` on any session fail with `error`
    pub fn fail_next_start_transaction(&self, error: Error) {
        *self.faults.start.lock() = Some(error);
    }

    /// Make the next `commit_transaction` on any session fail with `error`
    pub fn fail_next_commit(&self, error: Error) {
        *self.faults.commit.lock() = Some(error);
    }

    /// Make the next `abort_transaction` on any session fail with `error`
    pub fn fail_next_abort(&self, error: Error) {
        *self.faults.abort.lock() = Some(error);
    }

    /// Number of commits and direct writes applied so far
    pub fn version(&self) -> u64 {
        self.store.version()
    }

    /// Insert a document
    ///
    /// # Errors
    ///
    /// Server-reported `DuplicateKey` (11000) if `id` is already visible
    /// to the session.
    pub fn insert_one(
        &self,
        session: Option<&SessionHandle>,
        collection: &str,
        id: &str,
        doc: Value,
    ) -> Result<()> {
        self.write(
            session,
            WriteOp::Insert {
                collection: collection.to_string(),
                id: id.to_string(),
                doc,
            },
        )
    }

    /// Replace an existing document; returns whether a document matched
    pub fn replace_one(
        &self,
        session: Option<&SessionHandle>,
        collection: &str,
        id: &str,
        doc: Value,
    ) -> Result<bool> {
        if self.find_one(session, collection, id)?.is_none() {
            return Ok(false);
        }
        self.write(
            session,
            WriteOp::Replace {
                collection: collection.to_string(),
                id: id.to_string(),
                doc,
            },
        )?;
        Ok(true)
    }

    /// Delete a document; returns whether a document matched
    pub fn delete_one(
        &self,
        session: Option<&SessionHandle>,
        collection: &str,
        id: &str,
    ) -> Result<bool> {
        if self.find_one(session, collection, id)?.is_none() {
            return Ok(false);
        }
        self.write(
            session,
            WriteOp::Delete {
                collection: collection.to_string(),
                id: id.to_string(),
            },
        )?;
        Ok(true)
    }

    /// Read a document as seen by `session`
    pub fn find_one(
        &self,
        session: Option<&SessionHandle>,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>> {
        let session_id = self.transactional(session)?;
        Ok(self.store.read(session_id, collection, id))
    }

    /// Number of committed documents in `collection`
    pub fn count(&self, collection: &str) -> usize {
        self.store.count(collection)
    }

    fn write(&self, session: Option<&SessionHandle>, op: WriteOp) -> Result<()> {
        match self.transactional(session)? {
            Some(session_id) => self.store.buffer(session_id, op),
            None => self.store.write_direct(op),
        }
    }

    /// Session id to buffer under, or `None` to apply directly
    fn transactional(&self, session: Option<&SessionHandle>) -> Result<Option<SessionId>> {
        let Some(session) = session else {
            return Ok(None);
        };
        let state = session.state();
        if state.is_ended() {
            return Err(Error::Session(format!(
                "session {} has ended",
                session.id()
            )));
        }
        Ok(state.is_active().then(|| session.id()))
    }
}

#[async_trait]
impl Connection for MemoryClient {
    async fn start_session(&self, options: Option<&SessionOptions>) -> Result<SessionHandle> {
        let session = MemorySession::new(
            options.cloned(),
            Arc::clone(&self.store),
            Arc::clone(&self.journal),
            Arc::clone(&self.faults),
        );
        let session_id = txscope_core::Session::id(&session);
        self.journal.record(SessionEvent::SessionStarted {
            session_id,
            options: options.cloned(),
        });
        debug!(%session_id, "memory session started");
        Ok(Arc::new(session))
    }
}
