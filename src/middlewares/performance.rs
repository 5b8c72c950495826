use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::middleware::{ChangeTrackerItem, CrudAction, TransactionMiddleware};
use crate::result::ServiceResult;

/// Timing statistics for one action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationStats {
    pub count: u64,
    pub total: Duration,
    pub max: Duration,
}

impl OperationStats {
    pub fn average(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            let nanos = self.total.as_nanos() / u128::from(self.count);
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        }
    }

    fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }
}

/// Measures the time between prologue and epilogue of each action.
///
/// Only operations that complete are measured. Timings are keyed by action,
/// so overlapping operations of the same action from different threads
/// share one start slot.
///
/// Keep an `Arc` to read the statistics after attaching:
///
/// ```ignore
/// let perf = Arc::new(PerformanceMiddleware::new(Duration::from_millis(50)));
/// let service = TritonService::new(engine).attach(Arc::clone(&perf));
/// // ...
/// let commits = perf.stats(CrudAction::Commit);
/// ```
#[derive(Debug)]
pub struct PerformanceMiddleware {
    threshold: Duration,
    started: Mutex<HashMap<CrudAction, Instant>>,
    stats: Mutex<HashMap<CrudAction, OperationStats>>,
}

impl Default for PerformanceMiddleware {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl PerformanceMiddleware {
    /// Warn about operations slower than `threshold`.
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            started: Mutex::new(HashMap::new()),
            stats: Mutex::new(HashMap::new()),
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn stats(&self, action: CrudAction) -> OperationStats {
        self.stats
            .lock()
            .ok()
            .and_then(|stats| stats.get(&action).copied())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> HashMap<CrudAction, OperationStats> {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn reset(&self) {
        if let Ok(mut stats) = self.stats.lock() {
            stats.clear();
        }
    }
}

impl TransactionMiddleware for PerformanceMiddleware {
    fn name(&self) -> &str {
        "performance"
    }

    fn prologue(
        &self,
        action: CrudAction,
        _entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        if let Ok(mut started) = self.started.lock() {
            started.insert(action, Instant::now());
        }
        None
    }

    fn epilogue(
        &self,
        action: CrudAction,
        entities: Option<&[ChangeTrackerItem]>,
    ) -> Option<ServiceResult> {
        let start = self.started.lock().ok().and_then(|mut s| s.remove(&action))?;
        let elapsed = start.elapsed();

        if elapsed > self.threshold {
            warn!(
                %action,
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.threshold.as_millis() as u64,
                entities = entities.map(|e| e.len()).unwrap_or(0),
                "slow operation"
            );
        }

        if let Ok(mut stats) = self.stats.lock() {
            stats.entry(action).or_default().record(elapsed);
        }
        None
    }
}
