use std::thread;

use triton::{
    CrudReadTransaction, CrudWriteTransaction, EngineError, FailureReason, InMemoryEngine, Model,
    TritonService,
};

use crate::support::Account;

fn funded(balance: i64) -> (InMemoryEngine, TritonService<InMemoryEngine>) {
    let engine = InMemoryEngine::new();
    let service = TritonService::new(engine.clone());
    let mut tx = service.transaction();
    tx.create(Account::open("ACC-1", balance));
    assert!(tx.commit().is_success());
    (engine, service)
}

#[test]
fn reads_carry_the_stored_row_version() {
    let (_, service) = funded(100);
    let account = service
        .transaction()
        .read::<Account>(&"ACC-1".to_string())
        .into_value()
        .unwrap();
    assert!(!account.version.is_empty());
    assert_eq!(account.row_version(), Some(&account.version));
}

#[test]
fn stale_update_is_a_concurrency_failure() {
    let (_, service) = funded(100);
    let key = "ACC-1".to_string();

    let mut first = service.transaction();
    let mut second = service.transaction();
    let mut a = first.read::<Account>(&key).into_value().unwrap();
    let mut b = second.read::<Account>(&key).into_value().unwrap();

    a.balance += 10;
    first.update(a);
    assert!(first.commit().is_success());

    b.balance -= 50;
    assert!(second.update(b).is_success());
    assert_eq!(second.commit().reason(), Some(FailureReason::ConcurrencyFailure));

    let mut retry = service.transaction();
    let mut fresh = retry.read::<Account>(&key).into_value().unwrap();
    assert_eq!(fresh.balance, 110);
    fresh.balance -= 50;
    retry.update(fresh);
    assert!(retry.commit().is_success());
}

#[test]
fn update_without_reading_first_conflicts() {
    let (_, service) = funded(100);
    let mut tx = service.transaction();
    tx.update(Account::open("ACC-1", 0));
    assert_eq!(tx.commit().reason(), Some(FailureReason::ConcurrencyFailure));
}

#[test]
fn failed_batch_applies_nothing() {
    let (engine, service) = funded(100);
    let mut tx = service.transaction();
    tx.create(Account::open("ACC-2", 5));
    tx.update(Account::open("ACC-1", 0));

    assert!(tx.commit().is_failure());
    assert_eq!(engine.len(), 1);
    let check = service.transaction();
    assert_eq!(
        check.read::<Account>(&"ACC-2".to_string()).reason(),
        Some(FailureReason::NotFound)
    );
}

#[test]
fn injected_engine_error_maps_to_its_reason() {
    let (engine, service) = funded(100);
    engine.fail_next_commit(EngineError::UpdateFailed("disk full".into()));

    let mut tx = service.transaction();
    tx.create(Account::open("ACC-2", 5));
    let result = tx.commit();
    assert_eq!(result.reason(), Some(FailureReason::DbFailure));
    assert!(result.message().unwrap_or("").contains("disk full"));
}

#[test]
fn parallel_writers_one_wins() {
    let (_, service) = funded(0);
    let key = "ACC-1".to_string();
    let seed = service.transaction().read::<Account>(&key).into_value().unwrap();

    let outcomes: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let service = &service;
                let mut account = seed.clone();
                scope.spawn(move || {
                    let mut tx = service.transaction();
                    account.balance = n;
                    tx.update(account);
                    tx.commit().is_success()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|won| **won).count(), 1);
}
