use std::fmt;

use super::{FailureReason, ServiceResult};

/// Outcome of a query: a lazy sequence on success, a reason on failure.
pub struct QueryServiceResult<T> {
    outcome: ServiceResult,
    items: Option<Box<dyn Iterator<Item = T> + Send>>,
}

impl<T> QueryServiceResult<T> {
    /// A successful query over `items`. The iterator is not consumed here.
    pub fn success<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self {
            outcome: ServiceResult::ok(),
            items: Some(Box::new(items.into_iter())),
        }
    }

    pub fn fail_with(reason: FailureReason) -> Self {
        Self::from_result(ServiceResult::<()>::fail_with(reason))
    }

    /// A failed query carrying the reason and message of `result`.
    pub fn from_result<U>(result: ServiceResult<U>) -> Self {
        Self {
            outcome: result.cast_up(),
            items: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn reason(&self) -> Option<FailureReason> {
        self.outcome.reason()
    }

    pub fn message(&self) -> Option<&str> {
        self.outcome.message()
    }

    /// The non-generic outcome of the query.
    pub fn outcome(&self) -> &ServiceResult {
        &self.outcome
    }

    /// Drain the sequence into a vector, keeping the outcome.
    pub fn collect(self) -> ServiceResult<Vec<T>> {
        match self.items {
            Some(items) if self.outcome.is_success() => ServiceResult::success(items.collect()),
            _ => self.outcome.cast_up(),
        }
    }
}

impl<T: 'static> IntoIterator for QueryServiceResult<T> {
    type Item = T;
    type IntoIter = Box<dyn Iterator<Item = T> + Send>;

    /// Failed queries iterate as empty.
    fn into_iter(self) -> Self::IntoIter {
        self.items.unwrap_or_else(|| Box::new(std::iter::empty()))
    }
}

impl<T> From<FailureReason> for QueryServiceResult<T> {
    fn from(reason: FailureReason) -> Self {
        QueryServiceResult::fail_with(reason)
    }
}

impl<T> fmt::Debug for QueryServiceResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryServiceResult")
            .field("outcome", &self.outcome)
            .field("has_items", &self.items.is_some())
            .finish()
    }
}
