use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::middleware::{ChangeTrackerItem, CrudAction, TransactionMiddleware};
use crate::result::{FailureReason, ServiceResult};

struct FailureRule {
    action: CrudAction,
    reason: FailureReason,
    every: u64,
    calls: AtomicU64,
}

/// Injects failures and latency, for exercising error paths without a
/// misbehaving engine.
///
/// ```ignore
/// let sim = SimulationMiddleware::new()
///     .fail(CrudAction::Commit, FailureReason::NetworkFailure)
///     .with_latency(CrudAction::Read, Duration::from_millis(20));
/// ```
#[derive(Default)]
pub struct SimulationMiddleware {
    failures: Vec<FailureRule>,
    latency: Vec<(CrudAction, Duration)>,
}

impl SimulationMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call of `action` with `reason`.
    pub fn fail(self, action: CrudAction, reason: FailureReason) -> Self {
        self.fail_every(action, 1, reason)
    }

    /// Fail every `n`th call of `action` with `reason`.
    pub fn fail_every(mut self, action: CrudAction, n: u64, reason: FailureReason) -> Self {
        self.failures.push(FailureRule {
            action,
            reason,
            every: n.max(1),
            calls: AtomicU64::new(0),
        });
        self
    }

    /// Delay every call of `action` by `latency` before it runs.
    ///
    /// Hooks are synchronous, so the delay blocks the calling thread, and on
    /// the async paths that is a runtime worker. Keep it short there, or slow
    /// the engine instead with [`InMemoryEngine::with_latency`], which sleeps
    /// asynchronously on `commit_async`.
    ///
    /// [`InMemoryEngine::with_latency`]: crate::InMemoryEngine::with_latency
    pub fn with_latency(mut self, action: CrudAction, latency: Duration) -> Self {
        self.latency.push((action, latency));
        self
    }
}

impl TransactionMiddleware for SimulationMiddleware {
    fn name(&self) -> &str {
        "simulation"
    }

    fn prologue(
        &self,
        action: CrudAction,
        _entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        for (_, latency) in self.latency.iter().filter(|(a, _)| *a == action) {
            std::thread::sleep(*latency);
        }

        for rule in self.failures.iter().filter(|r| r.action == action) {
            let call = rule.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call % rule.every == 0 {
                debug!(%action, reason = %rule.reason, call, "simulated failure");
                return Some(ServiceResult::fail_with_message(
                    rule.reason,
                    format!("simulated {} failure", action),
                ));
            }
        }
        None
    }
}
