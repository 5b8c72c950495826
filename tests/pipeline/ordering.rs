use triton::{CrudAction, CrudReadTransaction, CrudWriteTransaction, FailureReason, InMemoryEngine, TritonService};

use crate::support::{ada, Step, Trace, User};

#[test]
fn prologues_stop_at_first_halt() {
    let trace = Trace::default();
    let service = TritonService::new(InMemoryEngine::new())
        .attach(Step::new("a", &trace))
        .attach(Step::halting("b", &trace, FailureReason::Forbidden))
        .attach(Step::new("c", &trace));

    let mut tx = service.transaction();
    let result = tx.create(ada());

    assert_eq!(result.reason(), Some(FailureReason::Forbidden));
    assert_eq!(trace.lines(), vec!["a:pre:create", "b:pre:create"]);
    assert!(!tx.has_pending_changes());
}

#[test]
fn early_epilogues_run_before_late_regardless_of_attach_order() {
    let trace = Trace::default();
    let recorder = trace.clone();
    let service = TritonService::new(InMemoryEngine::new())
        .attach_late(Step::new("late", &trace))
        .attach(Step::new("early", &trace))
        .add_epilogue(move |action, _| {
            recorder.push(format!("action:post:{}", action));
            None
        });

    let mut tx = service.transaction();
    assert!(tx.create(ada()).is_success());
    trace.clear();

    assert!(tx.commit().is_success());
    assert_eq!(
        trace.lines(),
        vec![
            "late:pre:commit",
            "early:pre:commit",
            "action:post:commit",
            "early:post:commit",
            "late:post:commit",
        ]
    );
}

#[test]
fn added_prologue_runs_first() {
    let trace = Trace::default();
    let recorder = trace.clone();
    let service = TritonService::new(InMemoryEngine::new())
        .attach(Step::new("a", &trace))
        .add_prologue(move |action, _| {
            recorder.push(format!("action:pre:{}", action));
            None
        });

    let tx = service.transaction();
    assert_eq!(tx.read::<User>(&1).reason(), Some(FailureReason::NotFound));
    assert_eq!(trace.lines(), vec!["action:pre:read", "a:pre:read"]);
}

#[test]
fn late_epilogue_is_skipped_when_early_one_halts() {
    let trace = Trace::default();
    let service = TritonService::new(InMemoryEngine::new())
        .attach_late(Step::new("late", &trace))
        .add_epilogue(|action, _| {
            (action == CrudAction::Create).then(|| FailureReason::Tamper.into())
        });

    let mut tx = service.transaction();
    assert_eq!(tx.create(ada()).reason(), Some(FailureReason::Tamper));
    assert_eq!(trace.lines(), vec!["late:pre:create"]);
}

#[test]
fn registrations_after_first_transaction_are_ignored() {
    let trace = Trace::default();
    let service = TritonService::new(InMemoryEngine::new()).attach(Step::new("a", &trace));
    drop(service.transaction());
    assert!(service.is_sealed());

    let service = service.attach(Step::halting("late-comer", &trace, FailureReason::Forbidden));
    let mut tx = service.transaction();
    assert!(tx.create(ada()).is_success());
    assert_eq!(service.pipeline().prologue_count(), 1);
}
