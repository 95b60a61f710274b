//! Error Handling Tests
//!
//! Failure outcomes: abort before end, no abort after server-reported
//! errors, unchanged passthrough, and commit/abort failures.

use crate::common::*;
use std::sync::atomic::{AtomicBool, Ordering};
use txscope::ErrorClassification;
use txscope_core::Error as CoreError;

#[tokio::test]
async fn application_error_aborts_then_ends() {
    let h = Harness::new();
    let scope = h.scope(());

    let err = scope
        .run(|| async {
            h.db.insert_one(current_session().as_ref(), "orders", "o1", json!({}))?;
            Err::<(), _>(Error::application("payment declined"))
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "application error: payment declined");
    assert_eq!(
        h.kinds(),
        vec!["session_started", "transaction_started", "aborted", "ended"]
    );
    assert_eq!(h.db.count("orders"), 0);
}

#[tokio::test]
async fn server_error_skips_abort() {
    let h = Harness::new();
    h.db.insert_one(None, "orders", "o1", json!({})).unwrap();
    let scope = h.scope(());

    let err = scope
        .run(|| async {
            h.db.insert_one(current_session().as_ref(), "orders", "o2", json!({}))?;
            h.db.insert_one(current_session().as_ref(), "orders", "o1", json!({}))?;
            Ok::<_, Error>(())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Server { code: 11000, .. }));
    assert_eq!(
        h.kinds(),
        vec!["session_started", "transaction_started", "ended"]
    );
    // Ending the session still throws away the buffered insert
    assert!(h.db.find_one(None, "orders", "o2").unwrap().is_none());
    assert_eq!(scope.metrics().total_abort_skipped, 1);
}

#[tokio::test]
async fn missing_connection_fails_before_any_session() {
    let h = Harness::new();
    let scope = h.scope("missing");
    let ran = AtomicBool::new(false);

    let err = scope
        .run(|| async {
            ran.store(true, Ordering::SeqCst);
            Ok::<_, Error>(())
        })
        .await
        .unwrap_err();

    assert!(err.is_connection_not_exist());
    match err {
        Error::ConnectionNotExist(e) => assert_eq!(e.name, "missing"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(!ran.load(Ordering::SeqCst));
    assert!(h.db.journal().is_empty());
}

#[tokio::test]
async fn body_value_passes_through() {
    let h = Harness::new();
    let scope = h.scope(());

    let value = scope
        .run(|| async { Ok::<_, Error>(vec![1, 2, 3]) })
        .await
        .unwrap();
    assert_eq!(value, vec![1, 2, 3]);
}

#[tokio::test]
async fn commit_failure_replaces_success() {
    let h = Harness::new();
    let scope = h.scope(());
    h.db.fail_next_commit(CoreError::server(112, "WriteConflict", "lost the race"));

    let err = scope
        .run(|| async {
            h.db.insert_one(current_session().as_ref(), "orders", "o1", json!({}))?;
            Ok::<_, Error>("done")
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Server { code: 112, .. }));
    assert_eq!(
        h.kinds(),
        vec!["session_started", "transaction_started", "ended"]
    );
    assert_eq!(h.db.count("orders"), 0);
    assert_eq!(scope.metrics().total_abort_skipped, 1);
}

#[tokio::test]
async fn client_side_commit_failure_is_aborted_before_end() {
    let h = Harness::new();
    let scope = h.scope(());
    h.db.fail_next_commit(CoreError::Session("network reset during commit".into()));

    let err = scope
        .run(|| async {
            h.db.insert_one(current_session().as_ref(), "orders", "o1", json!({}))?;
            Ok::<_, Error>(())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Session(ref msg) if msg == "network reset during commit"));
    assert_eq!(
        h.kinds(),
        vec!["session_started", "transaction_started", "aborted", "ended"]
    );
    assert_eq!(h.db.count("orders"), 0);
    assert_eq!(scope.metrics().total_aborted, 1);
}

#[tokio::test]
async fn start_transaction_failure_propagates_and_ends_session() {
    let h = Harness::new();
    let scope = h.scope(());
    h.db.fail_next_start_transaction(CoreError::Session("transaction refused".into()));
    let ran = AtomicBool::new(false);

    let err = scope
        .run(|| async {
            ran.store(true, Ordering::SeqCst);
            Ok::<_, Error>(())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Session(ref msg) if msg == "transaction refused"));
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(h.kinds(), vec!["session_started", "ended"]);

    let metrics = scope.metrics();
    assert_eq!(metrics.total_started, metrics.total_ended);
    assert_eq!(metrics.active_count, 0);
}

#[tokio::test]
async fn abort_failure_replaces_body_error() {
    let h = Harness::new();
    let scope = h.scope(());
    h.db.fail_next_abort(CoreError::Session("abort lost".into()));

    let err = scope
        .run(|| async { Err::<(), _>(Error::application("body failed")) })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Session(ref msg) if msg == "abort lost"));
    assert_eq!(h.count(SessionEvent::is_ended), 1);
}

#[tokio::test]
async fn write_conflict_is_retryable() {
    let h = Harness::new();
    let scope = h.scope(());

    let err = scope
        .run(|| async {
            h.db.insert_one(current_session().as_ref(), "orders", "o1", json!({"by": "tx"}))?;
            // Another writer commits the same id before this transaction does
            h.db.insert_one(None, "orders", "o1", json!({"by": "direct"}))?;
            Ok::<_, Error>(())
        })
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(
        h.db.find_one(None, "orders", "o1").unwrap(),
        Some(json!({"by": "direct"}))
    );
}

#[derive(Debug, thiserror::Error)]
enum ShopError {
    #[error("out of stock: {0}")]
    OutOfStock(String),
    #[error(transparent)]
    Store(#[from] txscope::Error),
}

impl From<CoreError> for ShopError {
    fn from(e: CoreError) -> Self {
        ShopError::Store(e.into())
    }
}

impl ErrorClassification for ShopError {
    fn is_server_reported(&self) -> bool {
        matches!(self, ShopError::Store(e) if e.is_server_reported())
    }
}

#[tokio::test]
async fn custom_error_type_passes_through_unchanged() {
    let h = Harness::new();
    let scope = h.scope(());

    let err = scope
        .run(|| async { Err::<(), _>(ShopError::OutOfStock("widget".into())) })
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::OutOfStock(ref item) if item == "widget"));
    assert!(h.kinds().contains(&"aborted"));

    let err = h
        .scope("missing")
        .run(|| async { Ok::<_, ShopError>(()) })
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::Store(ref e) if e.is_connection_not_exist()));
}

#[tokio::test]
async fn nested_server_error_propagates_to_owner() {
    let h = Harness::new();
    h.db.insert_one(None, "orders", "o1", json!({})).unwrap();
    let outer = h.scope(());
    let inner = h.scope(());

    let err = outer
        .run(|| async {
            inner
                .run(|| async {
                    h.db.insert_one(current_session().as_ref(), "orders", "o1", json!({}))?;
                    Ok::<_, Error>(())
                })
                .await
        })
        .await
        .unwrap_err();

    assert!(err.is_server_reported());
    assert_eq!(h.count(SessionEvent::is_aborted), 0);
    assert_eq!(h.count(SessionEvent::is_ended), 1);
    assert_eq!(outer.metrics().total_abort_skipped, 1);
    assert_eq!(inner.metrics().total_joined, 1);
}
