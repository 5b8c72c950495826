use tracing::{debug, info};

use crate::middleware::{ChangeTrackerItem, CrudAction, TransactionMiddleware};
use crate::result::ServiceResult;

/// Traces every operation through `tracing`.
///
/// Prologues log at `debug`, completed writes and commits at `info`.
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    entity_ids: bool,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include the ids of the entities involved.
    pub fn with_entity_ids(mut self) -> Self {
        self.entity_ids = true;
        self
    }

    fn describe(&self, entities: Option<&[ChangeTrackerItem]>) -> String {
        match entities {
            None => String::new(),
            Some(items) if self.entity_ids => items
                .iter()
                .map(|i| format!("{}:{}", i.collection(), i.id()))
                .collect::<Vec<_>>()
                .join(","),
            Some(items) => items
                .first()
                .map(|i| i.collection().to_string())
                .unwrap_or_default(),
        }
    }
}

impl TransactionMiddleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    fn prologue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        debug!(
            %action,
            count = entities.map(|e| e.len()).unwrap_or(0),
            entities = %self.describe(entities),
            "starting operation"
        );
        None
    }

    fn epilogue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        if action.is_write() {
            info!(
                %action,
                count = entities.map(|e| e.len()).unwrap_or(0),
                entities = %self.describe(entities),
                "operation completed"
            );
        } else {
            debug!(%action, entities = %self.describe(entities), "operation completed");
        }
        None
    }
}
