//! Per-item results of batch calls

use serde::{Deserialize, Serialize};

use super::record::Record;
use super::remote::RemoteError;
use crate::errors::AggregatedError;

/// Common view over per-item results so batches of any kind can be
/// classified the same way.
pub trait ItemResult {
    fn is_success(&self) -> bool;

    fn errors(&self) -> &[RemoteError];
}

/// Result of one item of a create, update or delete call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub id: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<RemoteError>,
}

impl OperationResult {
    /// Successful item with its remote id.
    pub fn succeeded(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), success: true, errors: Vec::new() }
    }

    /// Failed item with its errors.
    pub fn failed(errors: Vec<RemoteError>) -> Self {
        Self { id: None, success: false, errors }
    }
}

impl ItemResult for OperationResult {
    fn is_success(&self) -> bool {
        self.success
    }

    fn errors(&self) -> &[RemoteError] {
        &self.errors
    }
}

/// Result of one item of an upsert call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertResult {
    #[serde(flatten)]
    pub result: OperationResult,
    /// `true` when the upsert inserted, `false` when it updated
    pub created: bool,
}

impl UpsertResult {
    /// Successful upsert that inserted a record.
    pub fn created(id: impl Into<String>) -> Self {
        Self { result: OperationResult::succeeded(id), created: true }
    }

    /// Successful upsert that matched an existing record.
    pub fn updated(id: impl Into<String>) -> Self {
        Self { result: OperationResult::succeeded(id), created: false }
    }

    pub fn failed(errors: Vec<RemoteError>) -> Self {
        Self { result: OperationResult::failed(errors), created: false }
    }
}

impl ItemResult for UpsertResult {
    fn is_success(&self) -> bool {
        self.result.success
    }

    fn errors(&self) -> &[RemoteError] {
        &self.result.errors
    }
}

/// Result set of a query, returned verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub records: Vec<Record>,
    pub size: usize,
    pub done: bool,
    pub query_locator: Option<String>,
}

/// Classified outcome of one batch call.
///
/// The per-item results are kept in both arms; they are the source of truth,
/// the aggregate is a summary of the failed subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome<R> {
    /// Every item succeeded
    AllSucceeded(Vec<R>),
    /// At least one item failed; `results` still holds every item
    PartialOrTotalFailure { error: AggregatedError, results: Vec<R> },
}

impl<R> BatchOutcome<R> {
    /// Per-item results in input order.
    pub fn results(&self) -> &[R] {
        match self {
            Self::AllSucceeded(results) | Self::PartialOrTotalFailure { results, .. } => results,
        }
    }

    /// Whether every item succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::AllSucceeded(_))
    }

    /// Collapses the outcome: the failure arm becomes the aggregated error.
    pub fn into_result(self) -> Result<Vec<R>, AggregatedError> {
        match self {
            Self::AllSucceeded(results) => Ok(results),
            Self::PartialOrTotalFailure { error, .. } => Err(error),
        }
    }
}
