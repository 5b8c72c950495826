//! Ready-made middleware.
//!
//! - [`LoggingMiddleware`] - traces every operation.
//! - [`SecurityMiddleware`] - allow / deny rules keyed by principal,
//!   collection and action.
//! - [`PerformanceMiddleware`] - per-action timings, warns on slow calls.
//! - [`SimulationMiddleware`] - injects failures and latency for tests.
//! - [`JournalMiddleware`] - records committed changes.
//! - [`NotificationMiddleware`] - tells peers about committed changes.
//!
//! Journaling and notification should see the final outcome of a commit, so
//! attach them with `attach_late`.

mod journal;
mod logging;
mod notify;
mod performance;
mod security;
mod simulation;

pub use journal::{JournalEntry, JournalMiddleware};
pub use logging::LoggingMiddleware;
#[cfg(feature = "emitter")]
pub use notify::EmitterNotifier;
pub use notify::{ChangeNotification, CrudNotifier, NotificationMiddleware};
pub use performance::{OperationStats, PerformanceMiddleware};
pub use security::{AccessRule, Effect, Principal, SecurityMiddleware, Session, SessionHandle};
pub use simulation::SimulationMiddleware;
