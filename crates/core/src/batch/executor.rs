//! Batch executor
//!
//! Issues one remote call per operation under a borrowed session and
//! classifies the per-item results. Call-level faults are mapped onto the
//! error taxonomy here, at the call boundary.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use forcelink_domain::{
    ArgumentError, BatchOutcome, ClientConfig, ForceLinkError, ItemResult, OperationResult,
    QueryResult, Record, RemoteFault, Result, Session, UpsertResult,
};
use tracing::{debug, info, instrument, warn};

use super::aggregator::ErrorAggregator;
use super::input::{require, BatchInput};
use crate::remote::RemoteService;

/// Executes batch calls and classifies their results.
#[derive(Clone)]
pub struct BatchExecutor {
    remote: Arc<dyn RemoteService>,
    external_id_field: String,
    call_timeout: Duration,
}

impl BatchExecutor {
    /// Executor over `remote` using the call timeout and external id field of `config`.
    pub fn new(remote: Arc<dyn RemoteService>, config: &ClientConfig) -> Self {
        Self {
            remote,
            external_id_field: config.external_id_field.clone(),
            call_timeout: config.connection_timeout,
        }
    }

    /// Override the field upserts match on.
    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field = field.into();
        self
    }

    /// Field upserts match on.
    pub fn external_id_field(&self) -> &str {
        &self.external_id_field
    }

    /// Create `records` in one remote call.
    #[instrument(skip_all, fields(operation = "create"))]
    pub async fn create<'a>(
        &self,
        session: &Session,
        records: impl BatchInput<'a, Record>,
    ) -> Result<BatchOutcome<OperationResult>> {
        let records = require(records, "records")?;
        let results = self.call("create", self.remote.create(session, records)).await?;
        let outcome = classify(records.len(), results)?;
        if outcome.is_success() {
            info!(
                count = records.len(),
                object_type = object_type_of(records),
                "Successfully created {} {}(s)",
                records.len(),
                object_type_of(records)
            );
        }
        Ok(outcome)
    }

    /// Update `records` in one remote call; every record needs an id.
    #[instrument(skip_all, fields(operation = "update"))]
    pub async fn update<'a>(
        &self,
        session: &Session,
        records: impl BatchInput<'a, Record>,
    ) -> Result<BatchOutcome<OperationResult>> {
        let records = require(records, "records")?;
        let results = self.call("update", self.remote.update(session, records)).await?;
        let outcome = classify(records.len(), results)?;
        if outcome.is_success() {
            info!(
                count = records.len(),
                object_type = object_type_of(records),
                "Successfully updated {} {}(s)",
                records.len(),
                object_type_of(records)
            );
        }
        Ok(outcome)
    }

    /// Upsert matching on the configured external-identifier field.
    #[instrument(skip_all, fields(operation = "upsert", external_id_field = %self.external_id_field))]
    pub async fn upsert<'a>(
        &self,
        session: &Session,
        records: impl BatchInput<'a, Record>,
    ) -> Result<BatchOutcome<UpsertResult>> {
        let records = require(records, "records")?;
        if self.external_id_field.trim().is_empty() {
            return Err(ArgumentError::Blank("external id field").into());
        }
        let results = self
            .call("upsert", self.remote.upsert(session, &self.external_id_field, records))
            .await?;
        let outcome = classify(records.len(), results)?;
        if let BatchOutcome::AllSucceeded(results) = &outcome {
            let created = results.iter().filter(|result| result.created).count();
            let updated = results.len() - created;
            info!(
                updated,
                created,
                object_type = object_type_of(records),
                "Successfully upserted {}(s): {} updated and {} created",
                object_type_of(records),
                updated,
                created
            );
        }
        Ok(outcome)
    }

    /// Delete the given records by identifier.
    ///
    /// # Errors
    /// `ArgumentError::MissingIdentifier` when a record carries no id.
    pub async fn delete<'a>(
        &self,
        session: &Session,
        records: impl BatchInput<'a, Record>,
    ) -> Result<BatchOutcome<OperationResult>> {
        let records = require(records, "records")?;
        let ids = identifiers(records)?;
        self.delete_ids(session, &ids).await
    }

    /// Delete the records with the given ids in one remote call.
    #[instrument(skip_all, fields(operation = "delete"))]
    pub async fn delete_ids<'a>(
        &self,
        session: &Session,
        ids: impl BatchInput<'a, String>,
    ) -> Result<BatchOutcome<OperationResult>> {
        let ids = require(ids, "ids")?;
        let results = self.call("delete", self.remote.delete(session, ids)).await?;
        let outcome = classify(ids.len(), results)?;
        if outcome.is_success() {
            info!(count = ids.len(), "Successfully deleted {} records", ids.len());
        }
        Ok(outcome)
    }

    /// Run a query and return the result set verbatim.
    #[instrument(skip_all, fields(operation = "query"))]
    pub async fn query<'q>(
        &self,
        session: &Session,
        query: impl Into<Option<&'q str>>,
    ) -> Result<QueryResult> {
        let query = match query.into() {
            None => return Err(ArgumentError::Null("query").into()),
            Some(query) if query.trim().is_empty() => {
                return Err(ArgumentError::Blank("query").into())
            }
            Some(query) => query,
        };
        let result = self.call("query", self.remote.query(session, query)).await?;
        debug!(size = result.size, done = result.done, "query returned");
        Ok(result)
    }

    /// Bound the remote call by the connection timeout and map its fault.
    async fn call<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = std::result::Result<T, RemoteFault>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(fault)) => {
                let error = ForceLinkError::classify(fault);
                warn!(operation, %error, "remote call failed");
                Err(error)
            }
            Err(_) => {
                warn!(operation, timeout = ?self.call_timeout, "remote call timed out");
                Err(ForceLinkError::timeout(operation, self.call_timeout))
            }
        }
    }
}

/// Classify per-item results against an input of `expected` items.
fn classify<R: ItemResult>(expected: usize, results: Vec<R>) -> Result<BatchOutcome<R>> {
    if results.len() != expected {
        return Err(ForceLinkError::Transport(format!(
            "remote returned {} results for {} items",
            results.len(),
            expected
        )));
    }

    if results.iter().all(ItemResult::is_success) {
        return Ok(BatchOutcome::AllSucceeded(results));
    }

    let error = ErrorAggregator::from_failures(&results);
    debug!(failed_errors = error.len(), "batch contained failures");
    Ok(BatchOutcome::PartialOrTotalFailure { error, results })
}

/// Identifiers of `records`, in order.
pub(crate) fn identifiers(records: &[Record]) -> Result<Vec<String>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .id()
                .map(str::to_string)
                .ok_or(ForceLinkError::InvalidArgument(ArgumentError::MissingIdentifier { index }))
        })
        .collect()
}

fn object_type_of(records: &[Record]) -> &str {
    records.first().map_or("record", Record::object_type)
}
