use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{ChangeTrackerItem, CrudAction, MiddlewareAction, TransactionMiddleware};
use crate::result::ServiceResult;

/// Executes the prologue and epilogue chains of a pipeline.
pub trait MiddlewareRunner: Send + Sync {
    /// Run prologues in order. The first `Some` halts the chain and the
    /// operation.
    fn run_prologue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult>;

    /// Run the early epilogue tier, then the late tier. The first `Some`
    /// halts the chain and becomes the reported outcome.
    fn run_epilogue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult>;
}

/// One registered hook plus the name it is reported under.
#[derive(Clone)]
pub(crate) struct Hook {
    name: Arc<str>,
    action: MiddlewareAction,
}

impl Hook {
    pub(crate) fn new(name: &str, action: MiddlewareAction) -> Self {
        Self {
            name: Arc::from(name),
            action,
        }
    }

    pub(crate) fn prologue_of<T: TransactionMiddleware + 'static>(middleware: Arc<T>) -> Self {
        let name = middleware.name().to_string();
        Self::new(
            &name,
            Arc::new(move |action: CrudAction, entities: Option<&[ChangeTrackerItem]>| {
                middleware.prologue(action, entities)
            }),
        )
    }

    pub(crate) fn epilogue_of<T: TransactionMiddleware + 'static>(middleware: Arc<T>) -> Self {
        let name = middleware.name().to_string();
        Self::new(
            &name,
            Arc::new(move |action: CrudAction, entities: Option<&[ChangeTrackerItem]>| {
                middleware.epilogue(action, entities)
            }),
        )
    }

    fn run(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        (self.action)(action, entities)
    }
}

/// Immutable, ordered middleware pipeline shared by every transaction of a
/// service.
#[derive(Clone, Default)]
pub struct MiddlewarePipeline {
    prologues: Vec<Hook>,
    epilogues: Vec<Hook>,
    late_epilogues: Vec<Hook>,
}

impl MiddlewarePipeline {
    /// A pipeline with no hooks.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_hooks(
        prologues: Vec<Hook>,
        epilogues: Vec<Hook>,
        late_epilogues: Vec<Hook>,
    ) -> Self {
        Self {
            prologues,
            epilogues,
            late_epilogues,
        }
    }

    pub fn prologue_count(&self) -> usize {
        self.prologues.len()
    }

    /// Hooks across both epilogue tiers.
    pub fn epilogue_count(&self) -> usize {
        self.epilogues.len() + self.late_epilogues.len()
    }
}

impl MiddlewareRunner for MiddlewarePipeline {
    fn run_prologue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        for hook in &self.prologues {
            if let Some(result) = hook.run(action, entities) {
                debug!(
                    middleware = %hook.name,
                    %action,
                    reason = ?result.reason(),
                    "prologue halted operation"
                );
                return Some(result);
            }
        }
        None
    }

    fn run_epilogue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        for hook in self.epilogues.iter().chain(&self.late_epilogues) {
            if let Some(result) = hook.run(action, entities) {
                debug!(
                    middleware = %hook.name,
                    %action,
                    reason = ?result.reason(),
                    "epilogue replaced outcome"
                );
                return Some(result);
            }
        }
        None
    }
}

impl<R: MiddlewareRunner + ?Sized> MiddlewareRunner for Arc<R> {
    fn run_prologue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        (**self).run_prologue(action, entities)
    }

    fn run_epilogue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        (**self).run_epilogue(action, entities)
    }
}

impl fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewarePipeline")
            .field("prologues", &hook_names(&self.prologues))
            .field("epilogues", &hook_names(&self.epilogues))
            .field("late_epilogues", &hook_names(&self.late_epilogues))
            .finish()
    }
}

fn hook_names(hooks: &[Hook]) -> Vec<&str> {
    hooks.iter().map(|h| &*h.name).collect()
}
