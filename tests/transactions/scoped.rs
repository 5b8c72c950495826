use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use triton::{CrudAction, CrudWriteTransaction, FailureReason, InMemoryEngine, TritonService};

use crate::support::User;

#[test]
fn scope_exit_commits() {
    let engine = InMemoryEngine::new();
    let service = TritonService::new(engine.clone());
    {
        let mut tx = service.scoped_transaction();
        tx.create(User::new(1, "Ada"));
        tx.create(User::new(2, "Grace"));
    }
    assert_eq!(engine.len(), 2);
}

#[test]
fn cancel_skips_the_commit() {
    let engine = InMemoryEngine::new();
    let service = TritonService::new(engine.clone());

    let mut tx = service.scoped_transaction();
    tx.create(User::new(1, "Ada"));
    assert_eq!(tx.cancel(), 1);
    assert!(engine.is_empty());
}

#[test]
fn dispose_reports_the_outcome() {
    let engine = InMemoryEngine::new();
    let service = TritonService::new(engine.clone()).add_prologue(|action, _| {
        (action == CrudAction::Commit).then(|| FailureReason::Forbidden.into())
    });

    let mut tx = service.scoped_transaction();
    tx.create(User::new(1, "Ada"));
    assert_eq!(tx.dispose().reason(), Some(FailureReason::Forbidden));
    assert!(engine.is_empty());
}

#[test]
fn failed_dispose_does_not_commit_on_drop() {
    let engine = InMemoryEngine::new();
    let failed_once = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&failed_once);
    let service = TritonService::new(engine.clone()).add_prologue(move |action, _| {
        let first = action == CrudAction::Commit && !flag.swap(true, Ordering::SeqCst);
        first.then(|| FailureReason::NetworkFailure.into())
    });

    let mut tx = service.scoped_transaction();
    tx.create(User::new(1, "Ada"));
    assert_eq!(tx.dispose().reason(), Some(FailureReason::NetworkFailure));

    assert!(failed_once.load(Ordering::SeqCst));
    assert!(engine.is_empty());
}

#[tokio::test]
async fn dispose_async_commits() {
    let engine = InMemoryEngine::new();
    let service = TritonService::new(engine.clone());

    let mut tx = service.scoped_transaction();
    tx.create(User::new(1, "Ada"));
    assert_eq!(tx.dispose_async().await.into_value(), Some(1));
    assert_eq!(engine.len(), 1);
}
