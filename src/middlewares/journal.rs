use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::middleware::{ChangeTrackerItem, CrudAction, TransactionMiddleware};
use crate::result::ServiceResult;

/// One committed change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub action: CrudAction,
    pub collection: String,
    pub id: String,
    /// JSON snapshot of the entity as committed.
    pub entity: serde_json::Value,
    pub recorded_at_ms: u64,
}

impl JournalEntry {
    fn from_item(sequence: u64, item: &ChangeTrackerItem) -> Self {
        let entity = item.to_json().unwrap_or_else(|err| {
            warn!(collection = item.collection(), id = %item.id(), error = %err, "entity not journaled as JSON");
            serde_json::Value::Null
        });
        Self {
            sequence,
            action: item.action(),
            collection: item.collection().to_string(),
            id: item.id(),
            entity,
            recorded_at_ms: now_ms(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Records every successfully committed change.
///
/// Entries go to a shared buffer when one is given, otherwise they are
/// logged at `info`. Attach late so only commits that survived the early
/// epilogues are journaled.
pub struct JournalMiddleware {
    buffer: Option<Arc<Mutex<Vec<JournalEntry>>>>,
    sequence: AtomicU64,
}

impl Default for JournalMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl JournalMiddleware {
    pub fn new() -> Self {
        Self {
            buffer: None,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn with_buffer(buffer: Arc<Mutex<Vec<JournalEntry>>>) -> Self {
        Self {
            buffer: Some(buffer),
            sequence: AtomicU64::new(0),
        }
    }

    fn record(&self, entry: JournalEntry) {
        match &self.buffer {
            Some(buffer) => match buffer.lock() {
                Ok(mut buffer) => buffer.push(entry),
                Err(_) => warn!(sequence = entry.sequence, "journal buffer poisoned, entry dropped"),
            },
            None => match serde_json::to_string(&entry) {
                Ok(line) => info!(target: "triton::journal", "{}", line),
                Err(err) => warn!(error = %err, "journal entry not serializable"),
            },
        }
    }
}

impl TransactionMiddleware for JournalMiddleware {
    fn name(&self) -> &str {
        "journal"
    }

    fn epilogue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        if action != CrudAction::Commit {
            return None;
        }
        for item in entities.unwrap_or_default() {
            let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            self.record(JournalEntry::from_item(sequence, item));
        }
        None
    }
}
