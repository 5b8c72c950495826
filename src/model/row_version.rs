use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Optimistic concurrency token.
///
/// An opaque byte blob assigned by the persistence engine on every write.
/// An empty version means the instance was never read from the engine.
/// Serialized as base64 text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RowVersion(Vec<u8>);

impl RowVersion {
    pub fn new(bytes: Vec<u8>) -> Self {
        RowVersion(bytes)
    }

    /// Version derived from a monotonic counter (big-endian bytes).
    pub fn from_counter(counter: u64) -> Self {
        RowVersion(counter.to_be_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn from_base64(text: &str) -> Result<Self, base64::DecodeError> {
        STANDARD.decode(text).map(RowVersion)
    }
}

impl fmt::Display for RowVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

impl Serialize for RowVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for RowVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        RowVersion::from_base64(&text).map_err(serde::de::Error::custom)
    }
}
