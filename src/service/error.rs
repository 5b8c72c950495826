//! Error types for service configuration.

use std::error::Error;
use std::fmt;

/// Misuse of the service's configuration surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Middleware was registered after the first transaction was opened.
    ConfigurationSealed,
    /// A `TritonConfig` could not be loaded or failed validation.
    InvalidConfig(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::ConfigurationSealed => write!(
                f,
                "middleware configuration is sealed once the first transaction is opened"
            ),
            ServiceError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl Error for ServiceError {}
