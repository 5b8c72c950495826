use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::service::ServiceError;

/// Runtime settings shared by every transaction of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TritonConfig {
    /// Time budget for a commit, in milliseconds.
    /// Default: 5000
    #[serde(default = "default_server_timeout_ms")]
    pub server_timeout_ms: u64,

    /// Maximum number of rows a query may return. `None` means unbounded.
    /// Default: None
    #[serde(default)]
    pub query_limit: Option<usize>,

    /// Log a warning when a transaction is dropped with pending changes.
    /// Default: true
    #[serde(default = "default_warn_on_discard")]
    pub warn_on_discard: bool,
}

fn default_server_timeout_ms() -> u64 {
    5000
}

fn default_warn_on_discard() -> bool {
    true
}

impl Default for TritonConfig {
    fn default() -> Self {
        Self {
            server_timeout_ms: default_server_timeout_ms(),
            query_limit: None,
            warn_on_discard: default_warn_on_discard(),
        }
    }
}

impl TritonConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server_timeout(mut self, timeout: Duration) -> Self {
        self.server_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_server_timeout_ms(mut self, ms: u64) -> Self {
        self.server_timeout_ms = ms;
        self
    }

    pub fn with_query_limit(mut self, limit: usize) -> Self {
        self.query_limit = Some(limit);
        self
    }

    pub fn with_warn_on_discard(mut self, warn: bool) -> Self {
        self.warn_on_discard = warn;
        self
    }

    pub fn server_timeout(&self) -> Duration {
        Duration::from_millis(self.server_timeout_ms)
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ServiceError> {
        let config: TritonConfig =
            serde_json::from_str(json).map_err(|e| ServiceError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.server_timeout_ms == 0 {
            return Err(ServiceError::InvalidConfig(
                "server_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.query_limit == Some(0) {
            return Err(ServiceError::InvalidConfig(
                "query_limit must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Replace values `validate` would reject with their defaults.
    pub fn sanitized(mut self) -> Self {
        if self.server_timeout_ms == 0 {
            warn!(
                fallback_ms = default_server_timeout_ms(),
                "server_timeout_ms of zero ignored"
            );
            self.server_timeout_ms = default_server_timeout_ms();
        }
        if self.query_limit == Some(0) {
            warn!("query_limit of zero ignored, queries are unbounded");
            self.query_limit = None;
        }
        self
    }
}
