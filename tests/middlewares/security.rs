use triton::middlewares::{AccessRule, Principal, SecurityMiddleware, Session, SessionHandle};
use triton::{CrudAction, CrudReadTransaction, CrudWriteTransaction, FailureReason, InMemoryEngine, TritonService};

use crate::support::{note, user, Note, User};

fn guarded(session: &SessionHandle) -> (InMemoryEngine, TritonService<InMemoryEngine>) {
    let engine = InMemoryEngine::new();
    let security = SecurityMiddleware::new(session.clone())
        .rule(
            AccessRule::deny(Principal::User("guest".into()))
                .on_collection("users")
                .for_action(CrudAction::Delete),
        )
        .rule(
            AccessRule::deny(Principal::Role("visitor".into()))
                .on_collection("notes")
                .for_action(CrudAction::Read),
        );
    let service = TritonService::new(engine.clone()).attach(security);
    (engine, service)
}

#[test]
fn guest_cannot_delete_users() {
    let session = SessionHandle::new(Session::for_user("admin", "admin"));
    let (engine, service) = guarded(&session);

    let mut tx = service.transaction();
    tx.create(user(1, "Ada"));
    assert!(tx.commit().is_success());

    session.set(Session::for_user("guest", "member"));
    let mut tx = service.transaction();
    let result = tx.delete_by_key::<User>(&1);

    assert_eq!(result.reason(), Some(FailureReason::Forbidden));
    assert_eq!(result.message(), Some("guest may not delete users"));
    assert!(!tx.has_pending_changes());
    assert_eq!(tx.commit().into_value(), Some(0));
    assert_eq!(tx.read::<User>(&1).into_value(), Some(user(1, "Ada")));
    assert_eq!(engine.len(), 1);
}

#[test]
fn other_users_may_delete() {
    let session = SessionHandle::new(Session::for_user("admin", "admin"));
    let (engine, service) = guarded(&session);

    let mut tx = service.transaction();
    tx.create(user(1, "Ada"));
    tx.commit();

    assert!(tx.delete(user(1, "Ada")).is_success());
    assert!(tx.commit().is_success());
    assert!(engine.is_empty());
}

#[test]
fn denied_read_is_caught_after_loading() {
    let session = SessionHandle::new(Session::for_user("admin", "admin"));
    let (_, service) = guarded(&session);

    let mut tx = service.transaction();
    tx.create(note("n1", 1, "hello"));
    tx.commit();

    session.set(Session::for_user("walter", "visitor"));
    let tx = service.transaction();
    let result = tx.read::<Note>(&"n1".to_string());
    assert_eq!(result.reason(), Some(FailureReason::Forbidden));
    assert_eq!(result.value(), None);

    assert!(tx.read::<User>(&9).reason() == Some(FailureReason::NotFound));
}

#[test]
fn deny_by_default_needs_an_allow_rule() {
    let session = SessionHandle::new(Session::for_user("ada", "writer"));
    let security = SecurityMiddleware::new(session.clone())
        .deny_by_default()
        .rule(AccessRule::allow(Principal::Role("writer".into())));
    let service = TritonService::new(InMemoryEngine::new()).attach(security);

    let mut tx = service.transaction();
    assert!(tx.create(user(1, "Ada")).is_success());
    assert!(tx.commit().is_success());

    session.set(Session::new());
    let mut tx = service.transaction();
    let result = tx.create(user(2, "Mallory"));
    assert_eq!(result.reason(), Some(FailureReason::Forbidden));
    assert_eq!(result.message(), Some("anonymous may not create users"));
}

#[tokio::test]
async fn denied_read_also_covers_queries() {
    let session = SessionHandle::new(Session::for_user("admin", "admin"));
    let (_, service) = guarded(&session);

    let mut tx = service.transaction();
    tx.create(note("n1", 1, "hello"));
    tx.create(user(1, "Ada"));
    tx.commit();

    session.set(Session::for_user("walter", "visitor"));
    let tx = service.transaction();

    let all = tx.all::<Note>();
    assert_eq!(all.reason(), Some(FailureReason::Forbidden));
    assert_eq!(all.into_iter().count(), 0);

    let found = tx.search::<Note, _>(|n| n.author == 1);
    assert_eq!(found.reason(), Some(FailureReason::Forbidden));
    assert_eq!(found.value(), None);

    let found = tx.search_async::<Note, _>(|_| true).await;
    assert_eq!(found.reason(), Some(FailureReason::Forbidden));

    assert_eq!(tx.all::<User>().into_iter().count(), 1);
}
