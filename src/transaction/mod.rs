//! Transactions - the CRUD surface callers program against.
//!
//! A transaction reads through to the engine and stages writes in its own
//! change tracker until [`CrudWriteTransaction::commit`] submits them as one
//! batch. Every call runs inside the service's middleware pipeline and
//! reports its outcome as a [`ServiceResult`]; expected failures never
//! panic.
//!
//! ## Example
//!
//! ```ignore
//! use triton::{CrudReadTransaction, CrudWriteTransaction, InMemoryEngine, TritonService};
//!
//! let service = TritonService::new(InMemoryEngine::new());
//! let mut tx = service.transaction();
//!
//! tx.create(User::new(1, "ada"));
//! assert!(tx.commit().is_success());
//!
//! let user = tx.read::<User>(&1).into_value();
//! ```

mod change_tracker;
mod crud;
pub mod guard;
mod narrowed;
mod scoped;

use std::future::Future;

use crate::model::Model;
use crate::result::{QueryServiceResult, ServiceResult};

pub use crud::CrudTransaction;
pub use narrowed::{ReadTransaction, WriteTransaction};
pub use scoped::ScopedTransaction;

/// Read operations.
pub trait CrudReadTransaction {
    /// Load one entity by key. Pending writes of this transaction win over
    /// the committed row.
    fn read<M: Model>(&self, key: &M::Key) -> ServiceResult<M>;

    fn read_async<M: Model>(&self, key: &M::Key) -> impl Future<Output = ServiceResult<M>> + Send;

    /// Every committed entity of `M`'s collection.
    fn all<M: Model>(&self) -> QueryServiceResult<M>;

    /// Committed entities of `M`'s collection matching `predicate`.
    fn search<M, P>(&self, predicate: P) -> ServiceResult<Vec<M>>
    where
        M: Model,
        P: Fn(&M) -> bool;

    fn search_async<M, P>(&self, predicate: P) -> impl Future<Output = ServiceResult<Vec<M>>> + Send
    where
        M: Model,
        P: Fn(&M) -> bool + Send;
}

/// Write operations. Writes are staged until commit.
pub trait CrudWriteTransaction {
    fn create<M: Model>(&mut self, entity: M) -> ServiceResult;

    /// Update when an entity with the same key exists (pending or
    /// committed), create otherwise.
    fn create_or_update<M: Model>(&mut self, entity: M) -> ServiceResult;

    fn update<M: Model>(&mut self, entity: M) -> ServiceResult;

    fn delete<M: Model>(&mut self, entity: M) -> ServiceResult;

    /// Load the entity with `key`, then delete it.
    fn delete_by_key<M: Model>(&mut self, key: &M::Key) -> ServiceResult;

    /// Submit pending changes. On success the payload is the number of rows
    /// written.
    fn commit(&mut self) -> ServiceResult<usize>;

    fn commit_async(&mut self) -> impl Future<Output = ServiceResult<usize>> + Send;
}

/// Both read and write operations.
pub trait CrudReadWriteTransaction: CrudReadTransaction + CrudWriteTransaction {}

impl<T: CrudReadTransaction + CrudWriteTransaction> CrudReadWriteTransaction for T {}
