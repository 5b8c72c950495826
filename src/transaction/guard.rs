//! Guarded calls - the prologue / operation / epilogue sequence every
//! transaction operation goes through.
//!
//! [`try_call`] runs the prologue chain, executes the persistence
//! operation, turns engine failures into results, and runs the epilogue
//! chain on success. [`try_call_async`] does the same for operations that
//! produce a future; the future is only created once the prologue chain let
//! the operation through.

use std::future::Future;

use tracing::debug;

use crate::engine::{EngineError, EntityState};
use crate::middleware::{ChangeTrackerItem, CrudAction, MiddlewareRunner};
use crate::result::ServiceResult;

/// A single call into the persistence engine.
pub trait PersistenceOperation<T> {
    fn execute(self) -> Result<T, EngineError>;
}

impl<T, F> PersistenceOperation<T> for F
where
    F: FnOnce() -> Result<T, EngineError>,
{
    fn execute(self) -> Result<T, EngineError> {
        self()
    }
}

/// Translate an engine failure into a result value.
pub fn result_from_error<T>(error: &EngineError) -> ServiceResult<T> {
    ServiceResult::fail_with_error(error)
}

/// The operation a pending entity state amounts to.
pub fn map_state(state: EntityState) -> CrudAction {
    CrudAction::from(state)
}

/// Run `operation` inside the middleware pipeline.
///
/// `entities` is what the prologue sees. `outcome_entities` may supply what
/// the epilogue sees instead (a freshly read row, say); when it returns
/// `None` the epilogue sees `entities`.
pub fn try_call<R, T, Op, Out>(
    runner: &R,
    action: CrudAction,
    entities: Option<&[ChangeTrackerItem]>,
    operation: Op,
    outcome_entities: Out,
) -> ServiceResult<T>
where
    R: MiddlewareRunner + ?Sized,
    Op: PersistenceOperation<T>,
    Out: FnOnce(&T) -> Option<Vec<ChangeTrackerItem>>,
{
    if let Some(halted) = runner.run_prologue(action, entities) {
        return halted.cast_up();
    }

    match operation.execute() {
        Ok(value) => finish(runner, action, entities, value, outcome_entities),
        Err(err) => {
            debug!(%action, error = %err, "persistence call failed");
            result_from_error(&err)
        }
    }
}

/// Async counterpart of [`try_call`].
pub async fn try_call_async<R, T, Op, Fut, Out>(
    runner: &R,
    action: CrudAction,
    entities: Option<&[ChangeTrackerItem]>,
    operation: Op,
    outcome_entities: Out,
) -> ServiceResult<T>
where
    R: MiddlewareRunner + ?Sized,
    Op: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
    Out: FnOnce(&T) -> Option<Vec<ChangeTrackerItem>>,
{
    if let Some(halted) = runner.run_prologue(action, entities) {
        return halted.cast_up();
    }

    match operation().await {
        Ok(value) => finish(runner, action, entities, value, outcome_entities),
        Err(err) => {
            debug!(%action, error = %err, "persistence call failed");
            result_from_error(&err)
        }
    }
}

fn finish<R, T, Out>(
    runner: &R,
    action: CrudAction,
    entities: Option<&[ChangeTrackerItem]>,
    value: T,
    outcome_entities: Out,
) -> ServiceResult<T>
where
    R: MiddlewareRunner + ?Sized,
    Out: FnOnce(&T) -> Option<Vec<ChangeTrackerItem>>,
{
    let produced = outcome_entities(&value);
    let seen = produced.as_deref().or(entities);
    match runner.run_epilogue(action, seen) {
        Some(replaced) => replaced.cast_up(),
        None => ServiceResult::success(value),
    }
}

/// No outcome entities: the epilogue sees what the prologue saw.
pub fn same_entities<T>(_: &T) -> Option<Vec<ChangeTrackerItem>> {
    None
}
