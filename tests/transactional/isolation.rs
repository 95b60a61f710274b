//! Isolation Tests
//!
//! Independent call trees never observe each other's session, whether they
//! interleave on one task or run on separate worker threads.

use crate::common::*;
use std::collections::HashSet;
use std::time::Duration;

#[tokio::test]
async fn interleaved_call_trees_keep_their_own_session() {
    let h = Harness::new();
    let scope = h.scope(());

    let tree = |label: &'static str| {
        let scope = scope.clone();
        let db = Arc::clone(&h.db);
        async move {
            scope
                .run(|| async move {
                    let id = session_id();
                    for step in 0..5 {
                        tokio::task::yield_now().await;
                        assert_eq!(session_id(), id, "{label} lost its session at step {step}");
                    }
                    db.insert_one(current_session().as_ref(), "trees", label, json!({}))?;
                    Ok::<_, Error>(id)
                })
                .await
        }
    };

    let (a, b) = tokio::join!(tree("a"), tree("b"));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a, b);
    assert_eq!(h.count(SessionEvent::is_session_started), 2);
    assert_eq!(h.count(SessionEvent::is_committed), 2);
    assert_eq!(h.db.count("trees"), 2);
}

#[tokio::test]
async fn interleaved_failure_does_not_abort_sibling() {
    let h = Harness::new();
    let scope = h.scope(());

    let ok = async {
        scope
            .run(|| async {
                h.db.insert_one(current_session().as_ref(), "items", "kept", json!({}))?;
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok::<_, Error>(())
            })
            .await
    };
    let failing = async {
        scope
            .run(|| async {
                h.db.insert_one(current_session().as_ref(), "items", "dropped", json!({}))?;
                tokio::task::yield_now().await;
                Err::<(), _>(Error::application("rejected"))
            })
            .await
    };

    let (ok, failing) = tokio::join!(ok, failing);
    assert!(ok.is_ok());
    assert!(failing.is_err());

    assert!(h.db.find_one(None, "items", "kept").unwrap().is_some());
    assert!(h.db.find_one(None, "items", "dropped").unwrap().is_none());
    assert_eq!(h.count(SessionEvent::is_committed), 1);
    assert_eq!(h.count(SessionEvent::is_aborted), 1);
    assert_eq!(h.count(SessionEvent::is_ended), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn spawned_call_trees_get_distinct_sessions() {
    let h = Harness::new();
    let scope = h.scope(());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let scope = scope.clone();
            let db = Arc::clone(&h.db);
            tokio::spawn(async move {
                scope
                    .run(|| async move {
                        let id = session_id();
                        db.insert_one(
                            current_session().as_ref(),
                            "workers",
                            &format!("w{i}"),
                            json!({"session": id.to_string()}),
                        )?;
                        tokio::task::yield_now().await;
                        assert_eq!(session_id(), id);
                        Ok::<_, Error>(id)
                    })
                    .await
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().unwrap());
    }

    assert_eq!(ids.len(), 16);
    assert_eq!(h.db.count("workers"), 16);
    assert_eq!(scope.metrics().total_started, 16);
    assert_eq!(scope.metrics().total_joined, 0);
    assert_eq!(h.db.journal().sessions().len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn spawned_task_without_inherit_sees_no_session() {
    let h = Harness::new();
    let scope = h.scope(());

    let seen = scope
        .run(|| async {
            let seen = tokio::spawn(async { current_session().map(|s| s.id()) })
                .await
                .unwrap();
            Ok::<_, Error>(seen)
        })
        .await
        .unwrap();

    assert_eq!(seen, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn inherited_task_joins_the_session() {
    let h = Harness::new();
    let scope = h.scope(());
    let inner = scope.clone();
    let db = Arc::clone(&h.db);

    let (outer_id, child_id) = scope
        .run(|| async move {
            let outer_id = session_id();
            let child_id = tokio::spawn(inherit(async move {
                inner
                    .run(|| async {
                        db.insert_one(current_session().as_ref(), "jobs", "j1", json!({}))?;
                        Ok::<_, Error>(session_id())
                    })
                    .await
            }))
            .await
            .unwrap()?;
            Ok::<_, Error>((outer_id, child_id))
        })
        .await
        .unwrap();

    assert_eq!(outer_id, child_id);
    assert_eq!(h.db.count("jobs"), 1);
    assert_eq!(
        h.kinds(),
        vec!["session_started", "transaction_started", "committed", "ended"]
    );
}
