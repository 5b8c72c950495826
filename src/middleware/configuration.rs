use std::sync::Arc;

use super::runner::Hook;
use super::{ChangeTrackerItem, CrudAction, MiddlewareAction, MiddlewarePipeline, TransactionMiddleware};
use crate::result::ServiceResult;

/// Registration surface for middleware and free-standing hooks.
///
/// Ordering rules:
/// - attached middleware run their prologues in attach order;
/// - `add_prologue` jumps ahead of everything registered so far;
/// - epilogues run in two tiers, early then late, regardless of the order
///   in which the tiers were populated.
pub trait MiddlewareConfigurator {
    /// Attach a middleware. Its epilogue joins the early tier.
    fn attach<T: TransactionMiddleware + 'static>(&mut self, middleware: T) -> &mut Self;

    /// Attach a middleware whose epilogue joins the late tier.
    fn attach_late<T: TransactionMiddleware + 'static>(&mut self, middleware: T) -> &mut Self;

    /// Attach a default-constructed middleware.
    fn attach_default<T: TransactionMiddleware + Default + 'static>(&mut self) -> &mut Self {
        self.attach(T::default())
    }

    /// Register a prologue hook ahead of all current prologues.
    fn add_prologue<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(CrudAction, Option<&[ChangeTrackerItem]>) -> Option<ServiceResult>
            + Send
            + Sync
            + 'static;

    /// Register an epilogue hook at the front of the early tier.
    fn add_epilogue<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(CrudAction, Option<&[ChangeTrackerItem]>) -> Option<ServiceResult>
            + Send
            + Sync
            + 'static;

    /// Register an epilogue hook at the end of the late tier.
    fn add_late_epilogue<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(CrudAction, Option<&[ChangeTrackerItem]>) -> Option<ServiceResult>
            + Send
            + Sync
            + 'static;

    /// Snapshot of the current registrations, ready to run.
    fn runner(&self) -> MiddlewarePipeline;
}

/// Mutable middleware registry. Turned into a [`MiddlewarePipeline`] when
/// the owning service opens its first transaction.
#[derive(Clone, Default)]
pub struct TransactionConfiguration {
    prologues: Vec<Hook>,
    epilogues: Vec<Hook>,
    late_epilogues: Vec<Hook>,
}

impl TransactionConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.prologues.is_empty() && self.epilogues.is_empty() && self.late_epilogues.is_empty()
    }

    /// Register an already boxed hook ahead of all current prologues.
    pub fn add_prologue_action(&mut self, action: MiddlewareAction) -> &mut Self {
        self.prologues.insert(0, Hook::new("prologue action", action));
        self
    }

    /// Register an already boxed hook at the front of the early tier.
    pub fn add_epilogue_action(&mut self, action: MiddlewareAction) -> &mut Self {
        self.epilogues.insert(0, Hook::new("epilogue action", action));
        self
    }

    /// Register an already boxed hook at the end of the late tier.
    pub fn add_late_epilogue_action(&mut self, action: MiddlewareAction) -> &mut Self {
        self.late_epilogues
            .push(Hook::new("late epilogue action", action));
        self
    }
}

impl MiddlewareConfigurator for TransactionConfiguration {
    fn attach<T: TransactionMiddleware + 'static>(&mut self, middleware: T) -> &mut Self {
        let middleware = Arc::new(middleware);
        self.prologues.push(Hook::prologue_of(Arc::clone(&middleware)));
        self.epilogues.push(Hook::epilogue_of(middleware));
        self
    }

    fn attach_late<T: TransactionMiddleware + 'static>(&mut self, middleware: T) -> &mut Self {
        let middleware = Arc::new(middleware);
        self.prologues.push(Hook::prologue_of(Arc::clone(&middleware)));
        self.late_epilogues.push(Hook::epilogue_of(middleware));
        self
    }

    fn add_prologue<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(CrudAction, Option<&[ChangeTrackerItem]>) -> Option<ServiceResult>
            + Send
            + Sync
            + 'static,
    {
        self.add_prologue_action(Arc::new(action))
    }

    fn add_epilogue<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(CrudAction, Option<&[ChangeTrackerItem]>) -> Option<ServiceResult>
            + Send
            + Sync
            + 'static,
    {
        self.add_epilogue_action(Arc::new(action))
    }

    fn add_late_epilogue<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(CrudAction, Option<&[ChangeTrackerItem]>) -> Option<ServiceResult>
            + Send
            + Sync
            + 'static,
    {
        self.add_late_epilogue_action(Arc::new(action))
    }

    fn runner(&self) -> MiddlewarePipeline {
        MiddlewarePipeline::from_hooks(
            self.prologues.clone(),
            self.epilogues.clone(),
            self.late_epilogues.clone(),
        )
    }
}
