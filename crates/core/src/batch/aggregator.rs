//! Folds per-item failures of one batch into a single error

use forcelink_domain::{AggregatedError, ItemResult, RemoteError};

/// Builds [`AggregatedError`]s from failed batch items.
///
/// Every error of every failed item is kept, in the aggregate's total
/// order, whatever order the items arrived in.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorAggregator;

impl ErrorAggregator {
    /// Flatten the errors of the failed items among `results`.
    pub fn from_failures<'a, R, I>(results: I) -> AggregatedError
    where
        R: ItemResult + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let errors: Vec<RemoteError> = results
            .into_iter()
            .filter(|result| !result.is_success())
            .flat_map(|result| result.errors().iter().cloned())
            .collect();
        AggregatedError::new(errors)
    }

    /// Aggregate an already flattened error list.
    pub fn from_errors(errors: impl IntoIterator<Item = RemoteError>) -> AggregatedError {
        AggregatedError::new(errors.into_iter().collect())
    }
}
