use std::sync::Arc;

use crate::engine::{EngineError, EntityState, StagedWrite};
use crate::middleware::ChangeTrackerItem;
use crate::model::{EntityRef, Model};

struct Entry {
    item: ChangeTrackerItem,
    write: StagedWrite,
}

/// Pending changes of one transaction, in staging order.
///
/// Each entity appears at most once. Staging the same entity again folds
/// the two changes:
///
/// | pending  | new      | result   |
/// |----------|----------|----------|
/// | Added    | Modified | Added    |
/// | Added    | Deleted  | (none)   |
/// | Modified | Deleted  | Deleted  |
/// | Deleted  | Added    | Modified |
#[derive(Default)]
pub(crate) struct ChangeTracker {
    entries: Vec<Entry>,
}

impl ChangeTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, collection: &str, id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.write.collection == collection && e.write.id == id)
    }

    /// Pending state and snapshot of the entity with this key, if any.
    pub(crate) fn get<M: Model>(&self, id: &str) -> Option<(EntityState, M)> {
        let entry = &self.entries[self.position(M::COLLECTION, id)?];
        let entity = entry.item.downcast::<M>()?.clone();
        Some((entry.write.state, entity))
    }

    pub(crate) fn state_of<M: Model>(&self, id: &str) -> Option<EntityState> {
        self.position(M::COLLECTION, id)
            .map(|i| self.entries[i].write.state)
    }

    /// Fold `entity` into the pending changes.
    pub(crate) fn stage<M: Model>(
        &mut self,
        entity: M,
        state: EntityState,
    ) -> Result<(), EngineError> {
        let id = entity.id_as_string();
        let existing = self.position(M::COLLECTION, &id);
        let previous = existing.map(|i| &self.entries[i].write);

        let (state, expected_version) = match (previous.map(|w| w.state), state) {
            (Some(EntityState::Added), EntityState::Deleted) => {
                if let Some(i) = existing {
                    self.entries.remove(i);
                }
                return Ok(());
            }
            (Some(EntityState::Added), EntityState::Modified) => (EntityState::Added, None),
            (Some(EntityState::Deleted), EntityState::Added) => (
                EntityState::Modified,
                previous.and_then(|w| w.expected_version.clone()),
            ),
            (_, EntityState::Added) => (EntityState::Added, None),
            (_, state) => (state, entity.row_version().cloned()),
        };

        let payload = match state {
            EntityState::Added | EntityState::Modified => Some(bitcode::serialize(&entity)?),
            EntityState::Deleted | EntityState::Unchanged => None,
        };

        let entity: EntityRef = Arc::new(entity);
        let entry = Entry {
            item: ChangeTrackerItem::from_ref(entity, state),
            write: StagedWrite {
                collection: M::COLLECTION,
                id,
                state,
                payload,
                expected_version,
            },
        };

        match existing {
            Some(i) => self.entries[i] = entry,
            None => self.entries.push(entry),
        }
        Ok(())
    }

    /// Snapshot of the pending changes, as middleware sees them.
    pub(crate) fn items(&self) -> Vec<ChangeTrackerItem> {
        self.entries.iter().map(|e| e.item.clone()).collect()
    }

    /// Remove every pending change, returning the writes to submit.
    pub(crate) fn drain(&mut self) -> Vec<StagedWrite> {
        self.entries.drain(..).map(|e| e.write).collect()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
