//! Models - the persisted entities transactions operate on.
//!
//! Every entity type implements [`Model`]: it names its collection, exposes a
//! typed key, and (for optimistically concurrent entities) carries a
//! [`RowVersion`] that the engine refreshes on every read.
//!
//! ## Example
//!
//! ```ignore
//! use serde::{Deserialize, Serialize};
//! use triton::{Model, RowVersion};
//!
//! #[derive(Clone, Serialize, Deserialize, Model)]
//! #[model(collection = "accounts")]
//! struct Account {
//!     #[model(id)]
//!     number: u64,
//!     balance: i64,
//!     #[model(row_version)]
//!     #[serde(default)]
//!     version: RowVersion,
//! }
//! ```

mod key;
mod row_version;

use std::any::Any;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

pub use key::ModelKey;
pub use row_version::RowVersion;

/// Trait for types that can be persisted through a transaction.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Typed primary key.
    type Key: ModelKey;

    /// The collection name for this model type (a table, a key prefix, ...).
    const COLLECTION: &'static str;

    /// The primary key of this instance.
    fn id(&self) -> &Self::Key;

    /// String projection of the key, for identity comparisons that do not
    /// depend on the key type.
    fn id_as_string(&self) -> String {
        self.id().to_string()
    }

    /// Optimistic concurrency token. `None` for models without one.
    fn row_version(&self) -> Option<&RowVersion> {
        None
    }

    /// Store the token assigned by the engine. Ignored by models without one.
    fn set_row_version(&mut self, _version: RowVersion) {}
}

/// Object-safe view of a model instance, used where the concrete type has
/// been erased (change tracking, middleware).
pub trait TrackedEntity: Any + Send + Sync {
    fn collection(&self) -> &'static str;

    fn entity_id(&self) -> String;

    fn as_any(&self) -> &dyn Any;

    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;
}

impl<M: Model> TrackedEntity for M {
    fn collection(&self) -> &'static str {
        M::COLLECTION
    }

    fn entity_id(&self) -> String {
        Model::id_as_string(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Shared, type-erased handle to a model snapshot.
pub type EntityRef = Arc<dyn TrackedEntity>;

/// Storage key of a model instance: `"COLLECTION:id"`.
pub fn storage_key(collection: &str, id: &str) -> String {
    format!("{}:{}", collection, id)
}
