use std::fmt;

use crate::model::RowVersion;
use crate::result::FailureReason;

/// Failures raised by a persistence engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The addressed row does not exist.
    NotFound { collection: String, id: String },
    /// Optimistic concurrency check failed.
    ConcurrencyConflict {
        collection: String,
        id: String,
        expected: Option<RowVersion>,
        actual: Option<RowVersion>,
    },
    /// A create collided with an existing row.
    DuplicateKey { collection: String, id: String },
    /// The engine rejected the write for another reason.
    UpdateFailed(String),
    /// The operation was cancelled before it completed.
    Cancelled(String),
    /// The commit did not complete within its time budget.
    Timeout { budget_ms: u64 },
    /// A retrying engine gave up.
    RetryLimitExceeded { attempts: u32 },
    /// A query matched more rows than allowed.
    QueryOverLimit { limit: usize, found: usize },
    /// The query could not be executed as written.
    BadQuery(String),
    /// Row encoding or decoding failed.
    Serde(String),
    /// A storage lock was poisoned.
    LockPoisoned(&'static str),
    /// Engine-specific failure identified by an integer code.
    Other { code: i32, message: String },
}

impl EngineError {
    /// Classify this error. This is the fixed table every transaction uses
    /// to turn engine failures into result values.
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            EngineError::NotFound { .. } => FailureReason::NotFound,
            EngineError::Cancelled(_) => FailureReason::NetworkFailure,
            EngineError::Timeout { .. } => FailureReason::NetworkFailure,
            EngineError::ConcurrencyConflict { .. } => FailureReason::ConcurrencyFailure,
            EngineError::UpdateFailed(_) => FailureReason::DbFailure,
            EngineError::RetryLimitExceeded { .. } => FailureReason::NetworkFailure,
            EngineError::DuplicateKey { .. } => FailureReason::EntityDuplication,
            EngineError::QueryOverLimit { .. } => FailureReason::QueryOverLimit,
            EngineError::BadQuery(_) => FailureReason::BadQuery,
            EngineError::Serde(_) => FailureReason::DbFailure,
            EngineError::LockPoisoned(_) => FailureReason::ServiceFailure,
            EngineError::Other { code, .. } => FailureReason::from_code(*code),
        }
    }

    /// Integer code of this error.
    pub fn code(&self) -> i32 {
        self.failure_reason().code()
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NotFound { collection, id } => {
                write!(f, "row not found: {}:{}", collection, id)
            }
            EngineError::ConcurrencyConflict {
                collection,
                id,
                expected,
                actual,
            } => write!(
                f,
                "concurrency conflict on {}:{} (expected version {}, actual {})",
                collection,
                id,
                display_version(expected),
                display_version(actual)
            ),
            EngineError::DuplicateKey { collection, id } => {
                write!(f, "duplicate key: {}:{}", collection, id)
            }
            EngineError::UpdateFailed(msg) => write!(f, "update failed: {}", msg),
            EngineError::Cancelled(msg) => write!(f, "operation cancelled: {}", msg),
            EngineError::Timeout { budget_ms } => {
                write!(f, "commit exceeded server timeout of {} ms", budget_ms)
            }
            EngineError::RetryLimitExceeded { attempts } => {
                write!(f, "retry limit exceeded after {} attempts", attempts)
            }
            EngineError::QueryOverLimit { limit, found } => {
                write!(f, "query matched {} rows, limit is {}", found, limit)
            }
            EngineError::BadQuery(msg) => write!(f, "bad query: {}", msg),
            EngineError::Serde(msg) => write!(f, "row serialization error: {}", msg),
            EngineError::LockPoisoned(operation) => {
                write!(f, "engine lock poisoned during {}", operation)
            }
            EngineError::Other { code, message } => {
                write!(f, "engine error {:#x}: {}", code, message)
            }
        }
    }
}

fn display_version(version: &Option<RowVersion>) -> String {
    match version {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "none".to_string(),
    }
}

impl std::error::Error for EngineError {}

impl From<bitcode::Error> for EngineError {
    fn from(err: bitcode::Error) -> Self {
        EngineError::Serde(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serde(err.to_string())
    }
}
