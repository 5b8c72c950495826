//! Persistence engine - the storage collaborator behind every transaction.
//!
//! The engine is a black box that can look rows up by key, scan a
//! collection, and atomically apply a batch of staged writes. Transactions
//! never hand it engine-specific types; writes arrive type-erased as
//! [`StagedWrite`]s with bitcode-encoded payloads.
//!
//! Implement [`PersistenceEngine`] to put Triton in front of a database.
//! [`InMemoryEngine`] is the in-process implementation used for tests and
//! development.

mod error;
mod in_memory;

use std::future::Future;
use std::time::{Duration, Instant};

use crate::model::{storage_key, Model, RowVersion};

pub use error::EngineError;
pub use in_memory::InMemoryEngine;

/// Pending state of a tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityState {
    Added,
    Modified,
    Deleted,
    Unchanged,
}

/// A single type-erased write.
#[derive(Debug, Clone)]
pub struct StagedWrite {
    pub collection: &'static str,
    pub id: String,
    pub state: EntityState,
    /// Encoded row for `Added` / `Modified`, `None` for `Deleted`.
    pub payload: Option<Vec<u8>>,
    /// Version the row must still have for the write to apply.
    pub expected_version: Option<RowVersion>,
}

impl StagedWrite {
    /// Storage key: `"COLLECTION:id"`.
    pub fn key(&self) -> String {
        storage_key(self.collection, &self.id)
    }
}

/// Writes submitted together. Engines apply all of them or none.
#[derive(Debug, Clone)]
pub struct CommitBatch {
    pub writes: Vec<StagedWrite>,
    pub timeout: Option<Duration>,
    pub submitted_at: Instant,
}

impl CommitBatch {
    pub fn new(writes: Vec<StagedWrite>) -> Self {
        Self {
            writes,
            timeout: None,
            submitted_at: Instant::now(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Fails with [`EngineError::Timeout`] once the time budget is spent.
    pub fn check_deadline(&self) -> Result<(), EngineError> {
        match self.timeout {
            Some(timeout) if self.submitted_at.elapsed() > timeout => Err(EngineError::Timeout {
                budget_ms: timeout.as_millis() as u64,
            }),
            _ => Ok(()),
        }
    }
}

/// What a successful commit wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    pub written: usize,
}

/// Storage backend contract.
///
/// The async methods default to the sync ones; engines with real I/O
/// override them.
pub trait PersistenceEngine: Send + Sync + 'static {
    /// Look a row up by key. Returned models carry their current row version.
    fn find<M: Model>(&self, key: &M::Key) -> Result<Option<M>, EngineError>;

    /// Every row of the model's collection.
    fn scan<M: Model>(&self) -> Result<Vec<M>, EngineError>;

    /// Apply a batch atomically.
    fn commit(&self, batch: &CommitBatch) -> Result<CommitReceipt, EngineError>;

    fn find_async<'a, M: Model>(
        &'a self,
        key: &'a M::Key,
    ) -> impl Future<Output = Result<Option<M>, EngineError>> + Send + 'a {
        async move { self.find::<M>(key) }
    }

    fn scan_async<M: Model>(&self) -> impl Future<Output = Result<Vec<M>, EngineError>> + Send + '_ {
        async move { self.scan::<M>() }
    }

    fn commit_async<'a>(
        &'a self,
        batch: &'a CommitBatch,
    ) -> impl Future<Output = Result<CommitReceipt, EngineError>> + Send + 'a {
        async move { self.commit(batch) }
    }
}
