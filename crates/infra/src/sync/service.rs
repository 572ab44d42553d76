//! Background synchronisation of local entities to the remote service.
//!
//! Tasks run on spawned tokio tasks whose join handles are tracked. A task's
//! failure is logged and never reaches the submitter. Shutdown cancels every
//! in-flight task and joins them within a timeout.
//!
//! # Example
//!
//! ```no_run
//! use forcelink_core::RecordService;
//! use forcelink_domain::Record;
//! use forcelink_infra::sync::{SyncService, SyncServiceConfig};
//! use serde_json::json;
//!
//! # async fn example(records: RecordService) -> forcelink_domain::Result<()> {
//! let service = SyncService::new(records, SyncServiceConfig::default());
//! service.sync("ACME".to_string(), |name: &String| {
//!     Ok(Record::new("Account").with_field("Name", json!(name)))
//! })?;
//! service.drain().await;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use forcelink_common::{CommonError, Lifecycle, LifecycleStatus};
use forcelink_core::RecordService;
use forcelink_domain::{ForceLinkError, Record, Result};
use futures::future::{join_all, BoxFuture};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

/// A unit of background work.
pub type SyncTask = BoxFuture<'static, Result<()>>;

/// Identifies one submitted task in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Configuration for the sync service.
#[derive(Debug, Clone)]
pub struct SyncServiceConfig {
    /// Join timeout when shutting down
    pub join_timeout: Duration,
}

impl Default for SyncServiceConfig {
    fn default() -> Self {
        Self { join_timeout: Duration::from_secs(5) }
    }
}

/// Runs sync tasks in the background.
pub struct SyncService {
    records: RecordService,
    config: SyncServiceConfig,
    cancellation: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
    status: RwLock<LifecycleStatus>,
}

impl SyncService {
    /// Service that upserts through `records`.
    pub fn new(records: RecordService, config: SyncServiceConfig) -> Self {
        Self {
            records,
            config,
            cancellation: CancellationToken::new(),
            handles: Mutex::new(Vec::new()),
            status: RwLock::new(LifecycleStatus::Created),
        }
    }

    /// Run `task` in the background.
    ///
    /// # Errors
    /// `ForceLinkError::Internal` once the service has shut down.
    pub fn execute<F>(&self, task: F) -> Result<TaskId>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let id = TaskId::new();
        if self.cancellation.is_cancelled() {
            return Err(CommonError::task_cancelled_with_reason(
                id.to_string(),
                "sync service is shut down",
            )
            .into());
        }

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(
            async move {
                tokio::select! {
                    () = cancel.cancelled() => debug!("sync task cancelled"),
                    result = task => match result {
                        Ok(()) => debug!("sync task finished"),
                        Err(error) => warn!(%error, "sync task failed"),
                    },
                }
            }
            .instrument(info_span!("sync_task", task_id = %id)),
        );

        let mut handles = self.handles.lock();
        handles.retain(|handle| !handle.is_finished());
        handles.push(handle);
        Ok(id)
    }

    /// Run `tasks` one after another in a single background task, stopping
    /// at the first failure.
    pub fn execute_chain(&self, tasks: Vec<SyncTask>) -> Result<TaskId> {
        let total = tasks.len();
        self.execute(async move {
            for (index, task) in tasks.into_iter().enumerate() {
                if let Err(error) = task.await {
                    warn!(index, skipped = total - index - 1, "sync chain stopped");
                    return Err(error);
                }
            }
            Ok(())
        })
    }

    /// Map `entity` to a record with `copy_fn` and upsert it in the
    /// background.
    pub fn sync<T, F>(&self, entity: T, copy_fn: F) -> Result<TaskId>
    where
        T: Send + 'static,
        F: FnOnce(&T) -> Result<Record> + Send + 'static,
    {
        let records = self.records.clone();
        self.execute(async move {
            let record = copy_fn(&entity)?;
            let result = records.upsert_one(&record).await?;
            debug!(
                id = result.result.id.as_deref().unwrap_or_default(),
                created = result.created,
                "entity synced"
            );
            Ok(())
        })
    }

    /// Number of tasks still running.
    pub fn in_flight(&self) -> usize {
        self.handles.lock().iter().filter(|handle| !handle.is_finished()).count()
    }

    /// Wait for every submitted task to finish, without cancelling them.
    pub async fn drain(&self) {
        loop {
            let handles = std::mem::take(&mut *self.handles.lock());
            if handles.is_empty() {
                return;
            }
            log_join_failures(join_all(handles).await);
        }
    }
}

fn log_join_failures(results: Vec<std::result::Result<(), tokio::task::JoinError>>) {
    for error in results.into_iter().filter_map(std::result::Result::err) {
        if error.is_panic() {
            warn!(%error, "sync task panicked");
        }
    }
}

#[async_trait]
impl Lifecycle for SyncService {
    type Error = ForceLinkError;

    async fn initialize(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            return Err(ForceLinkError::Internal("sync service is shut down".to_string()));
        }
        *self.status.write() = LifecycleStatus::Running;
        info!("Sync service started");
        Ok(())
    }

    /// Cancel in-flight tasks and join them within the configured timeout.
    #[instrument(skip(self))]
    async fn shutdown(&self) {
        *self.status.write() = LifecycleStatus::ShuttingDown;
        self.cancellation.cancel();

        let handles = std::mem::take(&mut *self.handles.lock());
        let count = handles.len();
        match tokio::time::timeout(self.config.join_timeout, join_all(handles)).await {
            Ok(results) => log_join_failures(results),
            Err(_) => warn!(
                count,
                error = %CommonError::timeout("sync_tasks", self.config.join_timeout),
                "sync tasks did not complete within timeout"
            ),
        }

        *self.status.write() = LifecycleStatus::Shutdown;
        info!("Sync service stopped");
    }

    fn status(&self) -> LifecycleStatus {
        *self.status.read()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use forcelink_core::testing::{test_config, CountingSessions, ScriptedRemote};
    use serde_json::json;

    use super::*;

    fn service(remote: &Arc<ScriptedRemote>) -> SyncService {
        let records = RecordService::new(
            remote.clone(),
            Arc::new(CountingSessions::established()),
            &test_config(),
        );
        SyncService::new(records, SyncServiceConfig::default())
    }

    #[tokio::test]
    async fn test_failed_task_is_not_propagated() {
        let remote = Arc::new(ScriptedRemote::new());
        let service = service(&remote);

        service.execute(async { Err(ForceLinkError::Transport("offline".into())) }).unwrap();
        service.drain().await;

        assert_eq!(service.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_failure() {
        let remote = Arc::new(ScriptedRemote::new());
        let service = service(&remote);
        let ran = Arc::new(AtomicUsize::new(0));

        let step = |fail: bool| -> SyncTask {
            let ran = ran.clone();
            Box::pin(async move {
                ran.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err(ForceLinkError::Transport("offline".into()))
                } else {
                    Ok(())
                }
            })
        };

        service.execute_chain(vec![step(false), step(true), step(false)]).unwrap();
        service.drain().await;

        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sync_upserts_mapped_record() {
        let remote = Arc::new(ScriptedRemote::new());
        let service = service(&remote);

        service
            .sync(("ACME", 42), |(name, size): &(&str, i32)| {
                Ok(Record::new("Account")
                    .with_field("Name", json!(name))
                    .with_field("NumberOfEmployees", json!(size)))
            })
            .unwrap();
        service.drain().await;

        let upserts = remote.calls_of("upsert:External_Id__c");
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].items, 1);
    }

    #[tokio::test]
    async fn test_mapping_failure_skips_remote() {
        let remote = Arc::new(ScriptedRemote::new());
        let service = service(&remote);

        service
            .sync((), |_: &()| Err(ForceLinkError::Internal("unmappable".into())))
            .unwrap();
        service.drain().await;

        assert!(remote.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_in_flight_tasks() {
        let remote = Arc::new(ScriptedRemote::new());
        let service = service(&remote);
        service.initialize().await.unwrap();

        service
            .execute(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })
            .unwrap();
        service.shutdown().await;

        assert_eq!(service.status(), LifecycleStatus::Shutdown);
        assert_eq!(service.in_flight(), 0);
        assert!(matches!(service.execute(async { Ok(()) }), Err(ForceLinkError::Internal(_))));
    }
}
