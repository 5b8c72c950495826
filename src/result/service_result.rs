use std::fmt;

use serde::{Deserialize, Serialize};

use super::FailureReason;
use crate::engine::EngineError;

/// Outcome of a single data operation.
///
/// A result is successful exactly when it carries no [`FailureReason`].
/// Successful results may carry a payload; failed results never do.
///
/// Two results compare equal when their reasons are equal, so every success
/// equals every other success regardless of message or payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResult<T = ()> {
    reason: Option<FailureReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<T>,
}

impl ServiceResult<()> {
    /// The canonical success result.
    pub fn ok() -> Self {
        Self {
            reason: None,
            message: None,
            value: Some(()),
        }
    }
}

impl<T> ServiceResult<T> {
    /// A successful result carrying `value`.
    pub fn success(value: T) -> Self {
        Self {
            reason: None,
            message: None,
            value: Some(value),
        }
    }

    /// A failed result with no diagnostic message.
    pub fn fail_with(reason: FailureReason) -> Self {
        Self {
            reason: Some(reason),
            message: None,
            value: None,
        }
    }

    /// A failed result with a diagnostic message.
    pub fn fail_with_message(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason: Some(reason),
            message: Some(message.into()),
            value: None,
        }
    }

    /// A failed result with reason [`FailureReason::Unknown`].
    pub fn fail_with_text(message: impl Into<String>) -> Self {
        Self::fail_with_message(FailureReason::Unknown, message)
    }

    /// A failed result describing an engine error.
    pub fn fail_with_error(error: &EngineError) -> Self {
        Self::fail_with_message(error.failure_reason(), error.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.reason.is_none()
    }

    pub fn is_failure(&self) -> bool {
        self.reason.is_some()
    }

    pub fn reason(&self) -> Option<FailureReason> {
        self.reason
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Attach or replace the diagnostic message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Re-type the result, keeping reason and message. The payload is dropped.
    pub fn cast_up<U>(self) -> ServiceResult<U> {
        ServiceResult {
            reason: self.reason,
            message: self.message,
            value: None,
        }
    }

    /// Transform the payload of a successful result.
    pub fn map<U, F>(self, f: F) -> ServiceResult<U>
    where
        F: FnOnce(T) -> U,
    {
        ServiceResult {
            reason: self.reason,
            message: self.message,
            value: self.value.map(f),
        }
    }

    /// Convert into a std `Result`, so callers can use `?`.
    pub fn into_result(self) -> Result<Option<T>, ServiceResult> {
        if self.reason.is_none() {
            Ok(self.value)
        } else {
            Err(self.cast_up())
        }
    }
}

impl<T> From<FailureReason> for ServiceResult<T> {
    fn from(reason: FailureReason) -> Self {
        ServiceResult::fail_with(reason)
    }
}

impl<T, U> PartialEq<ServiceResult<U>> for ServiceResult<T> {
    fn eq(&self, other: &ServiceResult<U>) -> bool {
        self.reason == other.reason
    }
}

impl<T> Eq for ServiceResult<T> {}

impl Default for ServiceResult<()> {
    fn default() -> Self {
        ServiceResult::ok()
    }
}

impl<T> fmt::Display for ServiceResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.reason, &self.message) {
            (None, _) => write!(f, "ok"),
            (Some(reason), Some(message)) => write!(f, "{}: {}", reason, message),
            (Some(reason), None) => write!(f, "{}", reason),
        }
    }
}
