//! Middleware - cross-cutting hooks around every transaction operation.
//!
//! Each operation runs the prologue chain, the persistence call, then the
//! epilogue chain. A hook that returns `Some(result)` stops its chain:
//!
//! - in a prologue the operation never runs and `result` is returned as is;
//! - in an epilogue the operation already ran, and `result` replaces the
//!   reported outcome (the write is not undone).
//!
//! ## Example
//!
//! ```ignore
//! use triton::{CrudAction, ChangeTrackerItem, FailureReason, ServiceResult, TransactionMiddleware};
//!
//! struct ReadOnly;
//!
//! impl TransactionMiddleware for ReadOnly {
//!     fn prologue(&self, action: CrudAction, _: Option<&[ChangeTrackerItem]>) -> Option<ServiceResult> {
//!         (action != CrudAction::Read).then(|| FailureReason::Forbidden.into())
//!     }
//! }
//!
//! let service = TritonService::new(InMemoryEngine::new()).attach(ReadOnly);
//! ```

mod configuration;
mod runner;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::EntityState;
use crate::model::{EntityRef, Model};
use crate::result::ServiceResult;

pub use configuration::{MiddlewareConfigurator, TransactionConfiguration};
pub use runner::{MiddlewarePipeline, MiddlewareRunner};

/// Category of a data operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrudAction {
    Create,
    Read,
    Update,
    Delete,
    Commit,
}

impl CrudAction {
    pub fn is_write(&self) -> bool {
        !matches!(self, CrudAction::Read)
    }
}

impl From<EntityState> for CrudAction {
    fn from(state: EntityState) -> Self {
        match state {
            EntityState::Deleted => CrudAction::Delete,
            EntityState::Modified => CrudAction::Update,
            EntityState::Added => CrudAction::Create,
            EntityState::Unchanged => CrudAction::Read,
        }
    }
}

impl fmt::Display for CrudAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrudAction::Create => "create",
            CrudAction::Read => "read",
            CrudAction::Update => "update",
            CrudAction::Delete => "delete",
            CrudAction::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Engine-agnostic snapshot of one entity and its pending state.
#[derive(Clone)]
pub struct ChangeTrackerItem {
    entity: EntityRef,
    state: EntityState,
}

impl ChangeTrackerItem {
    pub fn new<M: Model>(entity: M, state: EntityState) -> Self {
        Self {
            entity: Arc::new(entity),
            state,
        }
    }

    pub fn from_ref(entity: EntityRef, state: EntityState) -> Self {
        Self { entity, state }
    }

    pub fn collection(&self) -> &'static str {
        self.entity.collection()
    }

    /// String projection of the entity key.
    pub fn id(&self) -> String {
        self.entity.entity_id()
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    /// The operation this pending change amounts to.
    pub fn action(&self) -> CrudAction {
        CrudAction::from(self.state)
    }

    /// True when the entity belongs to `M`'s collection.
    pub fn is<M: Model>(&self) -> bool {
        self.entity.as_any().is::<M>()
    }

    pub fn downcast<M: Model>(&self) -> Option<&M> {
        self.entity.as_any().downcast_ref::<M>()
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        self.entity.to_json()
    }
}

impl fmt::Debug for ChangeTrackerItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTrackerItem")
            .field("collection", &self.collection())
            .field("id", &self.id())
            .field("state", &self.state)
            .finish()
    }
}

/// A free-standing prologue or epilogue hook.
pub type MiddlewareAction =
    Arc<dyn Fn(CrudAction, Option<&[ChangeTrackerItem]>) -> Option<ServiceResult> + Send + Sync>;

/// Cross-cutting logic hooked around every transaction operation.
///
/// Both hooks default to no-ops. `entities` is `None` for reads and queries
/// that do not address specific instances.
pub trait TransactionMiddleware: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs before the operation. `Some` halts it.
    fn prologue(
        &self,
        _action: CrudAction,
        _entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        None
    }

    /// Runs after a successful operation. `Some` replaces the outcome.
    fn epilogue(
        &self,
        _action: CrudAction,
        _entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        None
    }
}

impl<T: TransactionMiddleware + ?Sized> TransactionMiddleware for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn prologue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        (**self).prologue(action, entities)
    }

    fn epilogue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        (**self).epilogue(action, entities)
    }
}
