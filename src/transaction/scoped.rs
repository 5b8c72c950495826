use std::ops::{Deref, DerefMut};

use tracing::warn;

use super::{CrudTransaction, CrudWriteTransaction};
use crate::engine::PersistenceEngine;
use crate::result::ServiceResult;

/// A transaction that commits its pending changes when it goes out of scope.
///
/// Dropping commits synchronously. In async code prefer
/// [`dispose_async`](Self::dispose_async), which commits through the
/// engine's async path and returns the outcome.
///
/// ```ignore
/// {
///     let mut tx = service.scoped_transaction();
///     tx.create(user);
/// } // committed here
/// ```
///
/// `dispose`, `dispose_async` and `cancel` end the scope: whatever they
/// leave pending is discarded on drop, never committed a second time.
pub struct ScopedTransaction<E: PersistenceEngine> {
    inner: CrudTransaction<E>,
    finished: bool,
}

impl<E: PersistenceEngine> ScopedTransaction<E> {
    pub fn new(inner: CrudTransaction<E>) -> Self {
        Self {
            inner,
            finished: false,
        }
    }

    /// Commit now and end the scope.
    pub fn dispose(mut self) -> ServiceResult<usize> {
        self.finished = true;
        self.inner.commit()
    }

    /// Commit through the async path and end the scope.
    pub async fn dispose_async(mut self) -> ServiceResult<usize> {
        self.finished = true;
        self.inner.commit_async().await
    }

    /// End the scope without committing.
    pub fn cancel(mut self) -> usize {
        self.finished = true;
        self.inner.discard()
    }
}

impl<E: PersistenceEngine> Deref for ScopedTransaction<E> {
    type Target = CrudTransaction<E>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<E: PersistenceEngine> DerefMut for ScopedTransaction<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<E: PersistenceEngine> Drop for ScopedTransaction<E> {
    fn drop(&mut self) {
        if self.finished || !self.inner.has_pending_changes() {
            return;
        }
        let result = self.inner.commit();
        if let Some(reason) = result.reason() {
            warn!(
                %reason,
                message = result.message().unwrap_or(""),
                "commit on scope exit failed"
            );
        }
    }
}
