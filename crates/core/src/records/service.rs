//! Record service - the public CRUD and query surface
//!
//! Every operation validates its input once, then runs the remote call
//! through [`SessionRetryPolicy`] under the provider's current session. A
//! batch with failed items surfaces as `ForceLinkError::RemoteOperationFailed`.

use std::sync::Arc;

use forcelink_domain::{
    ArgumentError, ClientConfig, ForceLinkError, OperationResult, QueryResult, Record, Result,
    UpsertResult,
};
use tracing::instrument;

use crate::batch::executor::identifiers;
use crate::batch::{require, BatchExecutor, BatchInput};
use crate::remote::RemoteService;
use crate::session::{SessionProvider, SessionRetryPolicy};

/// CRUD and query operations with session-refreshing retries.
#[derive(Clone)]
pub struct RecordService {
    executor: BatchExecutor,
    sessions: Arc<dyn SessionProvider>,
    retry: SessionRetryPolicy,
}

impl RecordService {
    /// Service over `remote`, running every call under a session from `sessions`.
    pub fn new(
        remote: Arc<dyn RemoteService>,
        sessions: Arc<dyn SessionProvider>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            executor: BatchExecutor::new(remote, config),
            sessions,
            retry: SessionRetryPolicy::new(config.max_retries),
        }
    }

    /// The underlying executor, for callers that need per-item results of
    /// failed batches.
    pub fn executor(&self) -> &BatchExecutor {
        &self.executor
    }

    /// Session source shared with the retry policy.
    pub fn sessions(&self) -> &Arc<dyn SessionProvider> {
        &self.sessions
    }

    /// Create `records`, failing with every per-item error if any item fails.
    #[instrument(skip_all)]
    pub async fn create<'a>(
        &self,
        records: impl BatchInput<'a, Record>,
    ) -> Result<Vec<OperationResult>> {
        let records = require(records, "records")?;
        let outcome = self
            .retry
            .run("create", &*self.sessions, |session| async move {
                self.executor.create(&session, records).await
            })
            .await?;
        Ok(outcome.into_result()?)
    }

    /// Create a single record.
    pub async fn create_one(&self, record: &Record) -> Result<OperationResult> {
        single(self.create(std::slice::from_ref(record)).await?)
    }

    /// Update `records`; every record needs an id.
    #[instrument(skip_all)]
    pub async fn update<'a>(
        &self,
        records: impl BatchInput<'a, Record>,
    ) -> Result<Vec<OperationResult>> {
        let records = require(records, "records")?;
        let outcome = self
            .retry
            .run("update", &*self.sessions, |session| async move {
                self.executor.update(&session, records).await
            })
            .await?;
        Ok(outcome.into_result()?)
    }

    /// Update a single record.
    pub async fn update_one(&self, record: &Record) -> Result<OperationResult> {
        single(self.update(std::slice::from_ref(record)).await?)
    }

    /// Insert or update `records`, matched on the external id field.
    #[instrument(skip_all)]
    pub async fn upsert<'a>(
        &self,
        records: impl BatchInput<'a, Record>,
    ) -> Result<Vec<UpsertResult>> {
        let records = require(records, "records")?;
        let outcome = self
            .retry
            .run("upsert", &*self.sessions, |session| async move {
                self.executor.upsert(&session, records).await
            })
            .await?;
        Ok(outcome.into_result()?)
    }

    /// Upsert a single record.
    pub async fn upsert_one(&self, record: &Record) -> Result<UpsertResult> {
        single(self.upsert(std::slice::from_ref(record)).await?)
    }

    /// Delete records by their identifiers.
    #[instrument(skip_all)]
    pub async fn delete<'a>(
        &self,
        records: impl BatchInput<'a, Record>,
    ) -> Result<Vec<OperationResult>> {
        let records = require(records, "records")?;
        let ids = identifiers(records)?;
        self.delete_ids(&ids).await
    }

    /// Delete a single record by its id.
    pub async fn delete_one(&self, record: &Record) -> Result<OperationResult> {
        single(self.delete(std::slice::from_ref(record)).await?)
    }

    /// Delete the records with the given ids.
    #[instrument(skip_all)]
    pub async fn delete_ids<'a>(
        &self,
        ids: impl BatchInput<'a, String>,
    ) -> Result<Vec<OperationResult>> {
        let ids = require(ids, "ids")?;
        let outcome = self
            .retry
            .run("delete", &*self.sessions, |session| async move {
                self.executor.delete_ids(&session, ids).await
            })
            .await?;
        Ok(outcome.into_result()?)
    }

    /// Delete a single record id.
    pub async fn delete_id(&self, id: &str) -> Result<OperationResult> {
        single(self.delete_ids(&[id.to_string()]).await?)
    }

    /// Run `query` and return the remote result verbatim.
    #[instrument(skip_all)]
    pub async fn query<'q>(&self, query: impl Into<Option<&'q str>>) -> Result<QueryResult> {
        let query = match query.into() {
            None => return Err(ArgumentError::Null("query").into()),
            Some(query) if query.trim().is_empty() => {
                return Err(ArgumentError::Blank("query").into())
            }
            Some(query) => query,
        };
        self.retry
            .run("query", &*self.sessions, |session| async move {
                self.executor.query(&session, query).await
            })
            .await
    }
}

/// Unwrap the only result of a one-element batch.
fn single<R>(results: Vec<R>) -> Result<R> {
    let count = results.len();
    let mut results = results.into_iter();
    match (results.next(), results.next()) {
        (Some(result), None) => Ok(result),
        _ => Err(ForceLinkError::Transport(format!("expected 1 result, got {count}"))),
    }
}
