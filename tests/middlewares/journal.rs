use std::sync::{Arc, Mutex};

use triton::middlewares::{JournalEntry, JournalMiddleware};
use triton::{CrudAction, CrudWriteTransaction, FailureReason};

use crate::support::{fresh, note, user, User};

type Buffer = Arc<Mutex<Vec<JournalEntry>>>;

#[test]
fn committed_changes_are_journaled_in_order() {
    let buffer = Buffer::default();
    let (_, service) = fresh();
    let service = service.attach_late(JournalMiddleware::with_buffer(Arc::clone(&buffer)));

    let mut tx = service.transaction();
    tx.create(user(1, "Ada"));
    tx.create(note("n1", 1, "first"));
    assert!(buffer.lock().unwrap().is_empty());
    assert!(tx.commit().is_success());

    tx.delete_by_key::<User>(&1);
    assert!(tx.commit().is_success());

    let entries = buffer.lock().unwrap();
    let summary: Vec<(u64, CrudAction, &str, &str)> = entries
        .iter()
        .map(|e| (e.sequence, e.action, e.collection.as_str(), e.id.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, CrudAction::Create, "users", "1"),
            (2, CrudAction::Create, "notes", "n1"),
            (3, CrudAction::Delete, "users", "1"),
        ]
    );
    assert_eq!(entries[1].entity["body"], "first");
}

#[test]
fn rejected_commit_is_not_journaled() {
    let buffer = Buffer::default();
    let (engine, service) = fresh();
    let service = service
        .attach_late(JournalMiddleware::with_buffer(Arc::clone(&buffer)))
        .add_epilogue(|action, _| (action == CrudAction::Commit).then(|| FailureReason::Tamper.into()));

    let mut tx = service.transaction();
    tx.create(user(1, "Ada"));
    assert_eq!(tx.commit().reason(), Some(FailureReason::Tamper));

    assert_eq!(engine.len(), 1);
    assert!(buffer.lock().unwrap().is_empty());
}

#[test]
fn failed_commit_is_not_journaled() {
    let buffer = Buffer::default();
    let (_, service) = fresh();
    let service = service.attach_late(JournalMiddleware::with_buffer(Arc::clone(&buffer)));

    let mut tx = service.transaction();
    tx.create(user(1, "Ada"));
    tx.commit();
    tx.create(user(1, "Ada"));
    assert_eq!(tx.commit().reason(), Some(FailureReason::EntityDuplication));

    assert_eq!(buffer.lock().unwrap().len(), 1);
}
