use std::fmt;

use serde::{Deserialize, Serialize};

/// Why an operation failed.
///
/// The named variants cover the causes the framework knows about. Any other
/// integer code (typically a code reported by a persistence engine) is kept
/// verbatim in [`FailureReason::Code`], so the exact failure survives a
/// round trip through `code()` / `from_code()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum FailureReason {
    Unknown,
    Tamper,
    Forbidden,
    ServiceFailure,
    NetworkFailure,
    DbFailure,
    ValidationError,
    ConcurrencyFailure,
    NotFound,
    EntityDuplication,
    BadQuery,
    QueryOverLimit,
    /// Passthrough for codes with no named variant.
    Code(i32),
}

impl FailureReason {
    /// Map an integer code to a reason. Codes of named variants return the
    /// named variant, everything else becomes `Code(code)`.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => FailureReason::Unknown,
            1 => FailureReason::Tamper,
            2 => FailureReason::Forbidden,
            3 => FailureReason::ServiceFailure,
            4 => FailureReason::NetworkFailure,
            5 => FailureReason::DbFailure,
            6 => FailureReason::ValidationError,
            7 => FailureReason::ConcurrencyFailure,
            8 => FailureReason::NotFound,
            9 => FailureReason::EntityDuplication,
            10 => FailureReason::BadQuery,
            11 => FailureReason::QueryOverLimit,
            other => FailureReason::Code(other),
        }
    }

    /// Integer code of this reason.
    pub fn code(&self) -> i32 {
        match self {
            FailureReason::Unknown => 0,
            FailureReason::Tamper => 1,
            FailureReason::Forbidden => 2,
            FailureReason::ServiceFailure => 3,
            FailureReason::NetworkFailure => 4,
            FailureReason::DbFailure => 5,
            FailureReason::ValidationError => 6,
            FailureReason::ConcurrencyFailure => 7,
            FailureReason::NotFound => 8,
            FailureReason::EntityDuplication => 9,
            FailureReason::BadQuery => 10,
            FailureReason::QueryOverLimit => 11,
            FailureReason::Code(code) => *code,
        }
    }

    /// True for reasons outside the named set.
    pub fn is_passthrough(&self) -> bool {
        matches!(FailureReason::from_code(self.code()), FailureReason::Code(_))
    }
}

impl From<i32> for FailureReason {
    fn from(code: i32) -> Self {
        FailureReason::from_code(code)
    }
}

impl From<FailureReason> for i32 {
    fn from(reason: FailureReason) -> Self {
        reason.code()
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Unknown => write!(f, "unknown failure"),
            FailureReason::Tamper => write!(f, "tampering detected"),
            FailureReason::Forbidden => write!(f, "forbidden"),
            FailureReason::ServiceFailure => write!(f, "service failure"),
            FailureReason::NetworkFailure => write!(f, "network failure"),
            FailureReason::DbFailure => write!(f, "database failure"),
            FailureReason::ValidationError => write!(f, "validation error"),
            FailureReason::ConcurrencyFailure => write!(f, "concurrency failure"),
            FailureReason::NotFound => write!(f, "not found"),
            FailureReason::EntityDuplication => write!(f, "entity duplication"),
            FailureReason::BadQuery => write!(f, "bad query"),
            FailureReason::QueryOverLimit => write!(f, "query over limit"),
            FailureReason::Code(code) => write!(f, "failure code {:#x}", code),
        }
    }
}
