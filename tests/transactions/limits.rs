use std::time::Duration;

use triton::{
    CrudReadTransaction, CrudWriteTransaction, FailureReason, InMemoryEngine, TritonConfig,
    TritonService,
};

use crate::support::User;

fn seed(service: &TritonService<InMemoryEngine>, count: u64) {
    let mut tx = service.transaction();
    for id in 1..=count {
        tx.create(User::new(id, &format!("user{}", id)));
    }
    assert!(tx.commit().is_success());
}

#[test]
fn commit_slower_than_server_timeout_fails() {
    let engine = InMemoryEngine::new();
    let slow = engine.clone().with_latency(Duration::from_millis(40));
    let config = TritonConfig::new().with_server_timeout_ms(5);
    let service = TritonService::with_config(slow, config);

    let mut tx = service.transaction();
    tx.create(User::new(1, "Ada"));
    let result = tx.commit();

    assert_eq!(result.reason(), Some(FailureReason::NetworkFailure));
    assert!(engine.is_empty());
}

#[test]
fn query_over_limit() {
    let config = TritonConfig::new().with_query_limit(2);
    let service = TritonService::with_config(InMemoryEngine::new(), config);
    seed(&service, 3);

    let tx = service.transaction();
    let all = tx.all::<User>();
    assert_eq!(all.reason(), Some(FailureReason::QueryOverLimit));
    assert_eq!(all.into_iter().count(), 0);

    let narrow = tx.search::<User, _>(|u| u.id > 1);
    assert_eq!(narrow.into_value().map(|rows| rows.len()), Some(2));
}

#[test]
fn no_limit_returns_everything() {
    let service = TritonService::new(InMemoryEngine::new());
    seed(&service, 5);
    assert_eq!(service.transaction().all::<User>().into_iter().count(), 5);
}

#[test]
fn config_from_json() {
    let config = TritonConfig::from_json_str(r#"{ "server_timeout_ms": 250, "query_limit": 10 }"#).unwrap();
    assert_eq!(config.server_timeout(), Duration::from_millis(250));
    assert_eq!(config.query_limit, Some(10));
    assert!(config.warn_on_discard);

    let service = TritonService::with_config(InMemoryEngine::new(), config);
    assert_eq!(service.config().query_limit, Some(10));
    assert_eq!(service.transaction().config().server_timeout_ms, 250);
}

#[test]
fn invalid_config_is_rejected() {
    assert!(TritonConfig::from_json_str(r#"{ "server_timeout_ms": 0 }"#).is_err());
    assert!(TritonConfig::from_json_str("not json").is_err());
}

#[test]
fn zero_timeout_built_in_code_falls_back_to_default() {
    let engine = InMemoryEngine::new();
    let config = TritonConfig::new().with_server_timeout_ms(0).with_query_limit(0);
    let service = TritonService::with_config(engine.clone(), config);
    assert_eq!(service.config().server_timeout_ms, 5000);
    assert_eq!(service.config().query_limit, None);

    let mut tx = service.transaction();
    tx.create(User::new(1, "Ada"));
    assert_eq!(tx.commit().into_value(), Some(1));
    assert_eq!(engine.len(), 1);
}
