use std::future::Future;

use super::{CrudReadTransaction, CrudTransaction, CrudWriteTransaction};
use crate::engine::PersistenceEngine;
use crate::model::Model;
use crate::result::{QueryServiceResult, ServiceResult};

/// A transaction limited to reads.
pub struct ReadTransaction<E: PersistenceEngine>(CrudTransaction<E>);

impl<E: PersistenceEngine> ReadTransaction<E> {
    pub fn new(inner: CrudTransaction<E>) -> Self {
        Self(inner)
    }
}

impl<E: PersistenceEngine> CrudReadTransaction for ReadTransaction<E> {
    fn read<M: Model>(&self, key: &M::Key) -> ServiceResult<M> {
        self.0.read::<M>(key)
    }

    fn read_async<M: Model>(&self, key: &M::Key) -> impl Future<Output = ServiceResult<M>> + Send {
        self.0.read_async::<M>(key)
    }

    fn all<M: Model>(&self) -> QueryServiceResult<M> {
        self.0.all::<M>()
    }

    fn search<M, P>(&self, predicate: P) -> ServiceResult<Vec<M>>
    where
        M: Model,
        P: Fn(&M) -> bool,
    {
        self.0.search::<M, P>(predicate)
    }

    fn search_async<M, P>(&self, predicate: P) -> impl Future<Output = ServiceResult<Vec<M>>> + Send
    where
        M: Model,
        P: Fn(&M) -> bool + Send,
    {
        self.0.search_async::<M, P>(predicate)
    }
}

/// A transaction limited to writes.
pub struct WriteTransaction<E: PersistenceEngine>(CrudTransaction<E>);

impl<E: PersistenceEngine> WriteTransaction<E> {
    pub fn new(inner: CrudTransaction<E>) -> Self {
        Self(inner)
    }

    pub fn has_pending_changes(&self) -> bool {
        self.0.has_pending_changes()
    }

    pub fn pending_count(&self) -> usize {
        self.0.pending_count()
    }
}

impl<E: PersistenceEngine> CrudWriteTransaction for WriteTransaction<E> {
    fn create<M: Model>(&mut self, entity: M) -> ServiceResult {
        self.0.create(entity)
    }

    fn create_or_update<M: Model>(&mut self, entity: M) -> ServiceResult {
        self.0.create_or_update(entity)
    }

    fn update<M: Model>(&mut self, entity: M) -> ServiceResult {
        self.0.update(entity)
    }

    fn delete<M: Model>(&mut self, entity: M) -> ServiceResult {
        self.0.delete(entity)
    }

    fn delete_by_key<M: Model>(&mut self, key: &M::Key) -> ServiceResult {
        self.0.delete_by_key::<M>(key)
    }

    fn commit(&mut self) -> ServiceResult<usize> {
        self.0.commit()
    }

    fn commit_async(&mut self) -> impl Future<Output = ServiceResult<usize>> + Send {
        self.0.commit_async()
    }
}
