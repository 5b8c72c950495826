use triton::{
    CrudReadTransaction, CrudWriteTransaction, FailureReason, InMemoryEngine, TritonService,
};

use crate::support::User;

fn service() -> (InMemoryEngine, TritonService<InMemoryEngine>) {
    let engine = InMemoryEngine::new();
    (engine.clone(), TritonService::new(engine))
}

#[test]
fn create_commit_read() {
    let (engine, service) = service();
    let mut tx = service.transaction();
    assert!(tx.create(User::new(1, "Ada")).is_success());
    assert!(tx.create(User::new(2, "Grace")).is_success());
    assert_eq!(tx.commit().into_value(), Some(2));
    assert_eq!(engine.len(), 2);

    let tx = service.transaction();
    let ada = tx.read::<User>(&1).into_value().unwrap();
    assert_eq!(ada.email, "ada@example.com");
}

#[test]
fn reads_see_own_pending_writes() {
    let (engine, service) = service();
    let mut tx = service.transaction();
    tx.create(User::new(1, "Ada"));

    assert_eq!(tx.read::<User>(&1).into_value(), Some(User::new(1, "Ada")));
    assert!(engine.is_empty());

    let other = service.transaction();
    assert_eq!(other.read::<User>(&1).reason(), Some(FailureReason::NotFound));
    tx.discard();
}

#[test]
fn create_or_update_picks_the_right_operation() {
    let (engine, service) = service();
    let mut tx = service.transaction();

    assert!(tx.create_or_update(User::new(1, "Ada")).is_success());
    assert!(tx.commit().is_success());

    let renamed = User::new(1, "Lovelace");
    assert!(tx.create_or_update(renamed.clone()).is_success());
    assert_eq!(tx.commit().into_value(), Some(1));

    assert_eq!(engine.len(), 1);
    let all = service.transaction().all::<User>().collect().into_value();
    assert_eq!(all, Some(vec![renamed]));
}

#[test]
fn creating_an_existing_key_fails_at_commit() {
    let (_, service) = service();
    let mut tx = service.transaction();
    tx.create(User::new(1, "Ada"));
    tx.commit();

    let mut tx = service.transaction();
    assert!(tx.create(User::new(1, "Imposter")).is_success());
    assert_eq!(tx.commit().reason(), Some(FailureReason::EntityDuplication));
    assert!(!tx.has_pending_changes());
}

#[test]
fn creating_the_same_key_twice_in_one_transaction_fails() {
    let (_, service) = service();
    let mut tx = service.transaction();
    assert!(tx.create(User::new(1, "Ada")).is_success());
    assert_eq!(
        tx.create(User::new(1, "Ada again")).reason(),
        Some(FailureReason::EntityDuplication)
    );
    assert_eq!(tx.pending_count(), 1);
    tx.discard();
}

#[test]
fn delete_by_key() {
    let (engine, service) = service();
    let mut tx = service.transaction();
    tx.create(User::new(1, "Ada"));
    tx.commit();

    assert!(tx.delete_by_key::<User>(&1).is_success());
    assert_eq!(tx.read::<User>(&1).reason(), Some(FailureReason::NotFound));
    assert_eq!(tx.commit().into_value(), Some(1));
    assert!(engine.is_empty());

    assert_eq!(tx.delete_by_key::<User>(&1).reason(), Some(FailureReason::NotFound));
}

#[test]
fn create_then_delete_stages_nothing() {
    let (engine, service) = service();
    let mut tx = service.transaction();
    tx.create(User::new(1, "Ada"));
    assert!(tx.delete(User::new(1, "Ada")).is_success());
    assert!(!tx.has_pending_changes());
    assert_eq!(tx.commit().into_value(), Some(0));
    assert!(engine.is_empty());
}

#[test]
fn empty_keys_are_rejected_before_anything_runs() {
    let (_, service) = service();
    let mut tx = service.transaction();

    let result = tx.create(User::new(0, "Nobody"));
    assert_eq!(result.reason(), Some(FailureReason::ValidationError));
    assert_eq!(result.message(), Some("users key must not be empty"));
    assert_eq!(tx.read::<User>(&0).reason(), Some(FailureReason::ValidationError));
    assert!(!tx.has_pending_changes());
}

#[test]
fn search_filters_committed_rows() {
    let (_, service) = service();
    let mut tx = service.transaction();
    for (id, name) in [(1, "Ada"), (2, "Alan"), (3, "Grace")] {
        tx.create(User::new(id, name));
    }
    tx.commit();

    let found = tx
        .search::<User, _>(|u| u.name.starts_with('A'))
        .into_value()
        .unwrap();
    let ids: Vec<u64> = found.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn narrowed_transactions() {
    let (_, service) = service();

    let mut writer = service.write_transaction();
    writer.create(User::new(7, "Barbara"));
    assert_eq!(writer.pending_count(), 1);
    assert_eq!(writer.commit().into_value(), Some(1));
    assert!(!writer.has_pending_changes());

    let reader = service.read_transaction();
    assert_eq!(reader.read::<User>(&7).into_value().map(|u| u.name), Some("Barbara".to_string()));
    let all = reader.all::<User>();
    assert!(all.is_success());
    assert_eq!(all.into_iter().count(), 1);
}

#[test]
fn dropping_a_plain_transaction_discards_changes() {
    let (engine, service) = service();
    {
        let mut tx = service.transaction();
        tx.create(User::new(1, "Ada"));
    }
    assert!(engine.is_empty());
}
