//! Nesting Tests
//!
//! Nested scopes join the outermost session; only the owner finalizes it.

use crate::common::*;
use std::future::Future;
use std::pin::Pin;

fn descend(scope: &Transactional, depth: usize) -> Pin<Box<dyn Future<Output = Result<usize>> + '_>> {
    Box::pin(async move {
        if depth == 0 {
            return Ok(0);
        }
        scope
            .run(|| async move { Ok(1 + descend(scope, depth - 1).await?) })
            .await
    })
}

#[tokio::test]
async fn nested_scopes_share_one_session() {
    let h = Harness::new();
    let outer = h.scope(());
    let inner = h.scope(());

    let (outer_id, inner_id) = outer
        .run(|| async {
            let outer_id = session_id();
            let inner_id = inner.run(|| async { Ok::<_, Error>(session_id()) }).await?;
            Ok::<_, Error>((outer_id, inner_id))
        })
        .await
        .unwrap();

    assert_eq!(outer_id, inner_id);
    assert_eq!(
        h.kinds(),
        vec!["session_started", "transaction_started", "committed", "ended"]
    );
}

#[tokio::test]
async fn deep_nesting_starts_and_ends_once() {
    let h = Harness::new();
    let scope = h.scope(());

    assert_eq!(descend(&scope, 8).await.unwrap(), 8);
    assert_eq!(h.count(SessionEvent::is_session_started), 1);
    assert_eq!(h.count(SessionEvent::is_committed), 1);
    assert_eq!(h.count(SessionEvent::is_ended), 1);

    let metrics = scope.metrics();
    assert_eq!(metrics.total_started, 1);
    assert_eq!(metrics.total_joined, 7);
}

#[tokio::test]
async fn sequential_outer_calls_each_get_a_session() {
    let h = Harness::new();
    let scope = h.scope(());

    let first = scope.run(|| async { Ok::<_, Error>(session_id()) }).await.unwrap();
    let second = scope.run(|| async { Ok::<_, Error>(session_id()) }).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(h.count(SessionEvent::is_session_started), 2);
    assert_eq!(h.count(SessionEvent::is_ended), 2);
}

#[tokio::test]
async fn ledger_transfer_commits_atomically() {
    let h = Harness::new();
    let ledger = Ledger::new(&h);
    ledger.open_account("alice", 100).await.unwrap();
    ledger.open_account("bob", 0).await.unwrap();
    h.db.clear_journal();

    ledger.transfer("alice", "bob", 40).await.unwrap();

    assert_eq!(ledger.balance("alice"), Some(60));
    assert_eq!(ledger.balance("bob"), Some(40));
    assert_eq!(
        h.kinds(),
        vec!["session_started", "transaction_started", "committed", "ended"]
    );
}

#[tokio::test]
async fn ledger_failed_leg_rolls_back_whole_transfer() {
    let h = Harness::new();
    let ledger = Ledger::new(&h);
    ledger.open_account("alice", 100).await.unwrap();
    h.db.clear_journal();

    // Deposit into a missing account fails after the withdrawal was buffered
    let err = ledger.transfer("alice", "nobody", 40).await.unwrap_err();

    assert!(matches!(err, Error::Application(_)));
    assert_eq!(ledger.balance("alice"), Some(100));
    assert_eq!(
        h.kinds(),
        vec!["session_started", "transaction_started", "aborted", "ended"]
    );
}

#[tokio::test]
async fn nested_writes_visible_to_outer_before_commit() {
    let h = Harness::new();
    let ledger = Ledger::new(&h);
    ledger.open_account("alice", 10).await.unwrap();

    ledger
        .scope()
        .run(|| async {
            ledger.deposit("alice", 5).await?;
            let seen = h
                .db
                .find_one(current_session().as_ref(), "accounts", "alice")?
                .and_then(|doc| doc["balance"].as_i64());
            assert_eq!(seen, Some(15));
            assert_eq!(ledger.balance("alice"), Some(10));
            Ok::<_, Error>(())
        })
        .await
        .unwrap();

    assert_eq!(ledger.balance("alice"), Some(15));
}

#[tokio::test]
async fn wrapped_method_keeps_receiver() {
    let h = Harness::new();
    let ledger = Arc::new(Ledger::new(&h));
    ledger.open_account("alice", 50).await.unwrap();
    ledger.open_account("bob", 0).await.unwrap();

    let pay = h
        .scope(())
        .wrap(|(ledger, amount): (Arc<Ledger>, i64)| async move {
            ledger.transfer("alice", "bob", amount).await
        });

    pay.call((Arc::clone(&ledger), 20)).await.unwrap();
    pay.call((Arc::clone(&ledger), 20)).await.unwrap();

    assert_eq!(ledger.balance("alice"), Some(10));
    assert_eq!(ledger.balance("bob"), Some(40));
    assert_eq!(pay.scope().metrics().total_started, 2);
}

#[tokio::test]
async fn no_session_outside_scopes() {
    let h = Harness::new();
    let scope = h.scope(());

    assert!(current_session().is_none());
    scope.run(|| async { Ok::<_, Error>(()) }).await.unwrap();
    assert!(current_session().is_none());
    assert!(!txscope::current_context_exists());
}
