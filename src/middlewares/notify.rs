use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::middleware::{ChangeTrackerItem, CrudAction, TransactionMiddleware};
use crate::result::ServiceResult;

/// Message describing one committed change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub collection: String,
    pub id: String,
    pub action: CrudAction,
    pub entity: serde_json::Value,
}

impl ChangeNotification {
    pub fn from_item(item: &ChangeTrackerItem) -> Self {
        Self {
            collection: item.collection().to_string(),
            id: item.id(),
            action: item.action(),
            entity: item.to_json().unwrap_or(serde_json::Value::Null),
        }
    }

    /// Event name: `"collection:action"`, e.g. `"users:create"`.
    pub fn event_name(&self) -> String {
        format!("{}:{}", self.collection, self.action)
    }
}

/// Tells interested peers about committed changes.
pub trait CrudNotifier: Send + Sync {
    fn notify_peers(&self, action: CrudAction, items: &[ChangeTrackerItem]) -> ServiceResult;
}

impl<N: CrudNotifier + ?Sized> CrudNotifier for Arc<N> {
    fn notify_peers(&self, action: CrudAction, items: &[ChangeTrackerItem]) -> ServiceResult {
        (**self).notify_peers(action, items)
    }
}

/// Forwards committed changes to a [`CrudNotifier`].
///
/// A failed notification is logged and does not change the commit outcome,
/// unless the middleware is [`strict`](Self::strict).
pub struct NotificationMiddleware<N: CrudNotifier> {
    notifier: N,
    strict: bool,
}

impl<N: CrudNotifier> NotificationMiddleware<N> {
    pub fn new(notifier: N) -> Self {
        Self {
            notifier,
            strict: false,
        }
    }

    /// Report notification failures as the commit outcome.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}

impl<N: CrudNotifier> TransactionMiddleware for NotificationMiddleware<N> {
    fn name(&self) -> &str {
        "notification"
    }

    fn epilogue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        let items = match (action, entities) {
            (CrudAction::Commit, Some(items)) if !items.is_empty() => items,
            _ => return None,
        };

        let result = self.notifier.notify_peers(action, items);
        if result.is_success() {
            return None;
        }
        warn!(
            reason = ?result.reason(),
            message = result.message().unwrap_or(""),
            "peer notification failed"
        );
        self.strict.then_some(result)
    }
}

#[cfg(feature = "emitter")]
pub use emitter::EmitterNotifier;

#[cfg(feature = "emitter")]
mod emitter {
    use std::sync::Mutex;

    use event_emitter_rs::EventEmitter;

    use super::{ChangeNotification, CrudNotifier};
    use crate::middleware::{ChangeTrackerItem, CrudAction};
    use crate::result::{FailureReason, ServiceResult};

    /// Publishes each committed change on an in-process `EventEmitter`.
    ///
    /// The event name is `"collection:action"` and the payload is the
    /// [`ChangeNotification`] as a JSON string. Listeners run on their own
    /// threads; publishing does not wait for them.
    pub struct EmitterNotifier {
        emitter: Mutex<EventEmitter>,
    }

    impl Default for EmitterNotifier {
        fn default() -> Self {
            Self::new(EventEmitter::new())
        }
    }

    impl EmitterNotifier {
        pub fn new(emitter: EventEmitter) -> Self {
            Self {
                emitter: Mutex::new(emitter),
            }
        }

        /// Register a listener for `event` (e.g. `"users:create"`).
        pub fn on<F>(&self, event: &str, listener: F)
        where
            F: Fn(String) + Send + Sync + 'static,
        {
            if let Ok(mut emitter) = self.emitter.lock() {
                emitter.on(event, listener);
            }
        }
    }

    impl CrudNotifier for EmitterNotifier {
        fn notify_peers(&self, _action: CrudAction, items: &[ChangeTrackerItem]) -> ServiceResult {
            let mut emitter = match self.emitter.lock() {
                Ok(emitter) => emitter,
                Err(_) => {
                    return ServiceResult::fail_with_message(
                        FailureReason::ServiceFailure,
                        "event emitter poisoned",
                    )
                }
            };

            for item in items {
                let notification = ChangeNotification::from_item(item);
                match serde_json::to_string(&notification) {
                    Ok(payload) => {
                        emitter.emit(&notification.event_name(), payload);
                    }
                    Err(err) => {
                        return ServiceResult::fail_with_message(
                            FailureReason::ServiceFailure,
                            err.to_string(),
                        )
                    }
                }
            }
            ServiceResult::ok()
        }
    }
}
