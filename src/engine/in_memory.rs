//! InMemoryEngine - BTreeMap-backed engine for testing and development.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::Duration;

use super::{CommitBatch, CommitReceipt, EngineError, EntityState, PersistenceEngine};
use crate::model::{storage_key, Model, RowVersion};

/// Internal stored representation of a row.
struct StoredRow {
    bytes: Vec<u8>,
    version: u64,
}

/// In-memory engine backed by a `BTreeMap`.
///
/// Storage key is `"COLLECTION:id"`, rows are bitcode-encoded. Clones share
/// the same storage, so every transaction opened over a clone sees the same
/// rows. The map is guarded by one coarse lock.
#[derive(Clone)]
pub struct InMemoryEngine {
    storage: Arc<RwLock<BTreeMap<String, StoredRow>>>,
    next_version: Arc<AtomicU64>,
    injected: Arc<Mutex<Option<EngineError>>>,
    latency: Duration,
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEngine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(BTreeMap::new())),
            next_version: Arc::new(AtomicU64::new(1)),
            injected: Arc::new(Mutex::new(None)),
            latency: Duration::ZERO,
        }
    }

    /// The process-wide engine. Every call returns a handle to the same rows.
    pub fn shared() -> Self {
        static SHARED: OnceLock<InMemoryEngine> = OnceLock::new();
        SHARED.get_or_init(InMemoryEngine::new).clone()
    }

    /// Delay every commit by `latency`, simulating a remote server.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next commit fail with `error` without applying anything.
    pub fn fail_next_commit(&self, error: EngineError) {
        if let Ok(mut injected) = self.injected.lock() {
            *injected = Some(error);
        }
    }

    /// Number of stored rows across all collections.
    pub fn len(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every row.
    pub fn clear(&self) -> Result<(), EngineError> {
        self.storage
            .write()
            .map_err(|_| EngineError::LockPoisoned("clear"))?
            .clear();
        Ok(())
    }

    fn decode<M: Model>(row: &StoredRow) -> Result<M, EngineError> {
        let mut model: M = bitcode::deserialize(&row.bytes)?;
        model.set_row_version(RowVersion::from_counter(row.version));
        Ok(model)
    }

    fn take_injected(&self) -> Result<(), EngineError> {
        let mut injected = self
            .injected
            .lock()
            .map_err(|_| EngineError::LockPoisoned("inject"))?;
        match injected.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Validate the whole batch, then apply it under one write lock.
    fn apply(&self, batch: &CommitBatch) -> Result<CommitReceipt, EngineError> {
        self.take_injected()?;
        batch.check_deadline()?;

        let mut storage = self
            .storage
            .write()
            .map_err(|_| EngineError::LockPoisoned("commit"))?;

        for write in &batch.writes {
            let key = write.key();
            let existing = storage.get(&key);
            match write.state {
                EntityState::Added => {
                    if existing.is_some() {
                        return Err(EngineError::DuplicateKey {
                            collection: write.collection.to_string(),
                            id: write.id.clone(),
                        });
                    }
                }
                EntityState::Modified | EntityState::Deleted => {
                    let row = existing.ok_or_else(|| EngineError::NotFound {
                        collection: write.collection.to_string(),
                        id: write.id.clone(),
                    })?;
                    if let Some(expected) = &write.expected_version {
                        let actual = RowVersion::from_counter(row.version);
                        if *expected != actual {
                            return Err(EngineError::ConcurrencyConflict {
                                collection: write.collection.to_string(),
                                id: write.id.clone(),
                                expected: Some(expected.clone()),
                                actual: Some(actual),
                            });
                        }
                    }
                }
                EntityState::Unchanged => {}
            }
        }

        let mut written = 0;
        for write in &batch.writes {
            match (write.state, &write.payload) {
                (EntityState::Added | EntityState::Modified, Some(bytes)) => {
                    let version = self.next_version.fetch_add(1, Ordering::Relaxed);
                    storage.insert(
                        write.key(),
                        StoredRow {
                            bytes: bytes.clone(),
                            version,
                        },
                    );
                    written += 1;
                }
                (EntityState::Deleted, _) => {
                    storage.remove(&write.key());
                    written += 1;
                }
                _ => {}
            }
        }

        Ok(CommitReceipt { written })
    }
}

impl PersistenceEngine for InMemoryEngine {
    fn find<M: Model>(&self, key: &M::Key) -> Result<Option<M>, EngineError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| EngineError::LockPoisoned("read"))?;

        match storage.get(&storage_key(M::COLLECTION, &key.to_string())) {
            Some(row) => Ok(Some(Self::decode(row)?)),
            None => Ok(None),
        }
    }

    fn scan<M: Model>(&self) -> Result<Vec<M>, EngineError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| EngineError::LockPoisoned("scan"))?;

        let prefix = format!("{}:", M::COLLECTION);
        storage
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(_, row)| Self::decode(row))
            .collect()
    }

    fn commit(&self, batch: &CommitBatch) -> Result<CommitReceipt, EngineError> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        self.apply(batch)
    }

    fn commit_async<'a>(
        &'a self,
        batch: &'a CommitBatch,
    ) -> impl Future<Output = Result<CommitReceipt, EngineError>> + Send + 'a {
        async move {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.apply(batch)
        }
    }
}
