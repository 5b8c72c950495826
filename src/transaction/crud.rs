use std::sync::Arc;

use tracing::{debug, warn};

use super::change_tracker::ChangeTracker;
use super::guard::{result_from_error, same_entities, try_call, try_call_async};
use super::{CrudReadTransaction, CrudWriteTransaction};
use crate::config::TritonConfig;
use crate::engine::{CommitBatch, EngineError, EntityState, PersistenceEngine};
use crate::middleware::{ChangeTrackerItem, CrudAction, MiddlewarePipeline};
use crate::model::{Model, ModelKey};
use crate::result::{FailureReason, QueryServiceResult, ServiceResult};

/// Read-write transaction over a persistence engine.
///
/// Writes are staged and only reach the engine on commit. A transaction
/// dropped with pending changes discards them; use
/// [`ScopedTransaction`](super::ScopedTransaction) to commit on drop.
pub struct CrudTransaction<E: PersistenceEngine> {
    engine: E,
    pipeline: Arc<MiddlewarePipeline>,
    config: TritonConfig,
    tracker: ChangeTracker,
}

impl<E: PersistenceEngine> CrudTransaction<E> {
    pub fn new(engine: E, pipeline: Arc<MiddlewarePipeline>, config: TritonConfig) -> Self {
        Self {
            engine,
            pipeline,
            config,
            tracker: ChangeTracker::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn pipeline(&self) -> &MiddlewarePipeline {
        &self.pipeline
    }

    pub fn config(&self) -> &TritonConfig {
        &self.config
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.tracker.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.tracker.len()
    }

    /// Snapshot of the pending changes, in staging order.
    pub fn pending_changes(&self) -> Vec<ChangeTrackerItem> {
        self.tracker.items()
    }

    /// Drop every pending change. Returns how many were discarded.
    pub fn discard(&mut self) -> usize {
        let discarded = self.tracker.len();
        self.tracker.clear();
        discarded
    }

    /// A pending write of this transaction, if any. Pending deletes read as
    /// missing.
    fn pending<M: Model>(&self, key: &M::Key) -> Option<Result<M, EngineError>> {
        let id = key.to_string();
        match self.tracker.get::<M>(&id)? {
            (EntityState::Deleted, _) => Some(Err(not_found::<M>(id))),
            (_, entity) => Some(Ok(entity)),
        }
    }

    fn load<M: Model>(&self, key: &M::Key) -> Result<M, EngineError> {
        if let Some(found) = self.pending::<M>(key) {
            return found;
        }
        self.engine
            .find::<M>(key)?
            .ok_or_else(|| not_found::<M>(key.to_string()))
    }

    async fn load_async<M: Model>(&self, key: &M::Key) -> Result<M, EngineError> {
        if let Some(found) = self.pending::<M>(key) {
            return found;
        }
        self.engine
            .find_async::<M>(key)
            .await?
            .ok_or_else(|| not_found::<M>(key.to_string()))
    }

    fn within_limit<M>(&self, rows: Vec<M>) -> Result<Vec<M>, EngineError> {
        match self.config.query_limit {
            Some(limit) if rows.len() > limit => Err(EngineError::QueryOverLimit {
                limit,
                found: rows.len(),
            }),
            _ => Ok(rows),
        }
    }

    /// Stage one write inside the pipeline.
    fn stage<M: Model>(&mut self, action: CrudAction, entity: M, state: EntityState) -> ServiceResult {
        if entity.id().is_null() {
            return null_key::<M, ()>();
        }

        let items = [ChangeTrackerItem::new(entity.clone(), state)];
        let tracker = &mut self.tracker;
        try_call(
            &*self.pipeline,
            action,
            Some(&items),
            || -> Result<(), EngineError> {
                let id = entity.id_as_string();
                match (state, tracker.state_of::<M>(&id)) {
                    (EntityState::Added, Some(EntityState::Added | EntityState::Modified)) => {
                        return Err(EngineError::DuplicateKey {
                            collection: M::COLLECTION.to_string(),
                            id,
                        });
                    }
                    (EntityState::Modified | EntityState::Deleted, Some(EntityState::Deleted)) => {
                        return Err(not_found::<M>(id));
                    }
                    _ => {}
                }
                tracker.stage(entity, state)
            },
            same_entities,
        )
    }
}

fn not_found<M: Model>(id: String) -> EngineError {
    EngineError::NotFound {
        collection: M::COLLECTION.to_string(),
        id,
    }
}

fn null_key<M: Model, T>() -> ServiceResult<T> {
    ServiceResult::fail_with_message(
        FailureReason::ValidationError,
        format!("{} key must not be empty", M::COLLECTION),
    )
}

fn read_items<M: Model>(entity: &M) -> Option<Vec<ChangeTrackerItem>> {
    query_items(std::slice::from_ref(entity))
}

/// Loaded rows as seen by read epilogues.
fn query_items<M: Model>(rows: &[M]) -> Option<Vec<ChangeTrackerItem>> {
    Some(
        rows.iter()
            .map(|row| ChangeTrackerItem::new(row.clone(), EntityState::Unchanged))
            .collect(),
    )
}

fn log_commit(result: &ServiceResult<usize>, staged: usize) {
    match result.reason() {
        None => debug!(
            staged,
            written = result.value().copied().unwrap_or(0),
            "transaction committed"
        ),
        Some(reason) => warn!(
            staged,
            %reason,
            message = result.message().unwrap_or(""),
            "commit failed"
        ),
    }
}

impl<E: PersistenceEngine> CrudReadTransaction for CrudTransaction<E> {
    fn read<M: Model>(&self, key: &M::Key) -> ServiceResult<M> {
        if key.is_null() {
            return null_key::<M, M>();
        }
        try_call(
            &*self.pipeline,
            CrudAction::Read,
            None,
            || self.load::<M>(key),
            read_items::<M>,
        )
    }

    async fn read_async<M: Model>(&self, key: &M::Key) -> ServiceResult<M> {
        if key.is_null() {
            return null_key::<M, M>();
        }
        try_call_async(
            &*self.pipeline,
            CrudAction::Read,
            None,
            || self.load_async::<M>(key),
            read_items::<M>,
        )
        .await
    }

    fn all<M: Model>(&self) -> QueryServiceResult<M> {
        let result = try_call(
            &*self.pipeline,
            CrudAction::Read,
            None,
            || -> Result<Vec<M>, EngineError> { self.within_limit(self.engine.scan::<M>()?) },
            |rows: &Vec<M>| query_items(rows),
        );
        match result.into_result() {
            Ok(rows) => QueryServiceResult::success(rows.unwrap_or_default()),
            Err(failure) => QueryServiceResult::from_result(failure),
        }
    }

    fn search<M, P>(&self, predicate: P) -> ServiceResult<Vec<M>>
    where
        M: Model,
        P: Fn(&M) -> bool,
    {
        try_call(
            &*self.pipeline,
            CrudAction::Read,
            None,
            || -> Result<Vec<M>, EngineError> {
                let rows = self.engine.scan::<M>()?;
                self.within_limit(rows.into_iter().filter(|m| predicate(m)).collect())
            },
            |rows: &Vec<M>| query_items(rows),
        )
    }

    async fn search_async<M, P>(&self, predicate: P) -> ServiceResult<Vec<M>>
    where
        M: Model,
        P: Fn(&M) -> bool + Send,
    {
        try_call_async(
            &*self.pipeline,
            CrudAction::Read,
            None,
            || async move {
                let rows = self.engine.scan_async::<M>().await?;
                self.within_limit(rows.into_iter().filter(|m| predicate(m)).collect())
            },
            |rows: &Vec<M>| query_items(rows),
        )
        .await
    }
}

impl<E: PersistenceEngine> CrudWriteTransaction for CrudTransaction<E> {
    fn create<M: Model>(&mut self, entity: M) -> ServiceResult {
        self.stage(CrudAction::Create, entity, EntityState::Added)
    }

    fn create_or_update<M: Model>(&mut self, entity: M) -> ServiceResult {
        if entity.id().is_null() {
            return null_key::<M, ()>();
        }

        let exists = match self.tracker.state_of::<M>(&entity.id_as_string()) {
            Some(EntityState::Deleted) => false,
            Some(_) => true,
            None => match self.engine.find::<M>(entity.id()) {
                Ok(found) => found.is_some(),
                Err(err) => return result_from_error(&err),
            },
        };

        if exists {
            self.update(entity)
        } else {
            self.create(entity)
        }
    }

    fn update<M: Model>(&mut self, entity: M) -> ServiceResult {
        self.stage(CrudAction::Update, entity, EntityState::Modified)
    }

    fn delete<M: Model>(&mut self, entity: M) -> ServiceResult {
        self.stage(CrudAction::Delete, entity, EntityState::Deleted)
    }

    fn delete_by_key<M: Model>(&mut self, key: &M::Key) -> ServiceResult {
        if key.is_null() {
            return null_key::<M, ()>();
        }
        match self.load::<M>(key) {
            Ok(entity) => self.delete(entity),
            Err(err) => result_from_error(&err),
        }
    }

    fn commit(&mut self) -> ServiceResult<usize> {
        let items = self.tracker.items();
        let timeout = self.config.server_timeout();
        let engine = &self.engine;
        let tracker = &mut self.tracker;

        let result = try_call(
            &*self.pipeline,
            CrudAction::Commit,
            Some(&items),
            || -> Result<usize, EngineError> {
                let batch = CommitBatch::new(tracker.drain()).with_timeout(timeout);
                if batch.is_empty() {
                    return Ok(0);
                }
                engine.commit(&batch).map(|receipt| receipt.written)
            },
            same_entities,
        );

        log_commit(&result, items.len());
        result
    }

    async fn commit_async(&mut self) -> ServiceResult<usize> {
        let items = self.tracker.items();
        let timeout = self.config.server_timeout();
        let engine = &self.engine;
        let tracker = &mut self.tracker;

        let result = try_call_async(
            &*self.pipeline,
            CrudAction::Commit,
            Some(&items),
            move || async move {
                let batch = CommitBatch::new(tracker.drain()).with_timeout(timeout);
                if batch.is_empty() {
                    return Ok(0);
                }
                match tokio::time::timeout(timeout, engine.commit_async(&batch)).await {
                    Ok(receipt) => receipt.map(|r| r.written),
                    Err(_) => Err(EngineError::Timeout {
                        budget_ms: timeout.as_millis() as u64,
                    }),
                }
            },
            same_entities,
        )
        .await;

        log_commit(&result, items.len());
        result
    }
}

impl<E: PersistenceEngine> Drop for CrudTransaction<E> {
    fn drop(&mut self) {
        if !self.tracker.is_empty() && self.config.warn_on_discard {
            warn!(
                pending = self.tracker.len(),
                "transaction dropped with uncommitted changes, discarding them"
            );
        }
    }
}
