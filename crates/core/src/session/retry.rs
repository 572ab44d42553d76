//! Replays remote calls across session refreshes
//!
//! Attempt `n` runs the call under the current session. A transient
//! (`Session`) failure with budget left refreshes the session and replays;
//! any other failure, or a transient one with the budget spent, is returned
//! unchanged. A failing refresh returns the refresh error.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use forcelink_common::resilience::policies::ClassifiedRetry;
use forcelink_common::{RetryConfig, RetryError, RetryExecutor};
use forcelink_domain::{Result, Session};
use tracing::{debug, info, instrument};

use super::ports::{SessionProvider, NO_GENERATION};

/// Session-refreshing retry around a single remote call.
#[derive(Debug, Clone)]
pub struct SessionRetryPolicy {
    executor: RetryExecutor<ClassifiedRetry>,
    max_retries: u32,
}

impl SessionRetryPolicy {
    /// `max_retries` bounds the number of refreshes, so a call runs at most
    /// `max_retries + 1` times.
    pub fn new(max_retries: u32) -> Self {
        Self {
            executor: RetryExecutor::new(RetryConfig::immediate(max_retries), ClassifiedRetry),
            max_retries,
        }
    }

    /// Number of refreshes allowed per call.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Run `operation` under the current session, refreshing and replaying
    /// on transient failures.
    #[instrument(skip_all, fields(operation = name, max_retries = self.max_retries))]
    pub async fn run<P, F, Fut, T>(&self, name: &str, sessions: &P, operation: F) -> Result<T>
    where
        P: SessionProvider + ?Sized,
        F: Fn(Arc<Session>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let observed = AtomicU64::new(NO_GENERATION);
        let observed = &observed;
        let operation = &operation;

        let outcome = self
            .executor
            .execute_with_recovery(
                move || async move {
                    let session = sessions.current_session().await?;
                    observed.store(session.generation(), Ordering::SeqCst);
                    operation(session).await
                },
                move || async move {
                    let stale = observed.load(Ordering::SeqCst);
                    let session = sessions.refresh_after(stale).await?;
                    info!(stale, generation = session.generation(), "session refreshed for retry");
                    Ok(())
                },
            )
            .await;

        if outcome.recoveries > 0 {
            debug!(attempts = outcome.attempts, refreshes = outcome.recoveries, "retry sequence finished");
        }

        outcome.into_result().map_err(RetryError::into_source)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use forcelink_domain::{AggregatedError, ForceLinkError};

    use super::*;
    use crate::testing::CountingSessions;

    /// With an always-transient call and a budget of N, exactly N refreshes
    /// happen and the final error is the transient one.
    #[tokio::test]
    async fn test_refreshes_exactly_max_retries_times() {
        for max_retries in [0_u32, 1, 3] {
            let sessions = CountingSessions::established();
            let policy = SessionRetryPolicy::new(max_retries);
            let calls = AtomicU32::new(0);

            let result: Result<()> = policy
                .run("create", &sessions, |_session| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ForceLinkError::Session("INVALID_SESSION: expired".into()))
                })
                .await;

            assert!(matches!(result, Err(ForceLinkError::Session(_))));
            assert_eq!(sessions.refreshes(), max_retries);
            assert_eq!(calls.load(Ordering::SeqCst), max_retries + 1);
        }
    }

    #[tokio::test]
    async fn test_non_transient_failure_skips_refresh() {
        let sessions = CountingSessions::established();
        let policy = SessionRetryPolicy::new(5);

        let result: Result<()> = policy
            .run("update", &sessions, |_session| async {
                Err(ForceLinkError::RemoteOperationFailed(AggregatedError::new(vec![])))
            })
            .await;

        assert!(matches!(result, Err(ForceLinkError::RemoteOperationFailed(_))));
        assert_eq!(sessions.refreshes(), 0);
    }

    #[tokio::test]
    async fn test_replays_under_refreshed_session() {
        let sessions = CountingSessions::established();
        let policy = SessionRetryPolicy::new(1);

        let generation = policy
            .run("query", &sessions, |session| async move {
                if session.generation() == 1 {
                    Err(ForceLinkError::Session("stale".into()))
                } else {
                    Ok(session.generation())
                }
            })
            .await
            .unwrap();

        assert_eq!(generation, 2);
        assert_eq!(sessions.stale_generations(), vec![1]);
    }

    /// Without a session, the first attempt fails transiently and the
    /// refresh establishes one.
    #[tokio::test]
    async fn test_missing_session_is_established_by_refresh() {
        let sessions = CountingSessions::empty();
        let policy = SessionRetryPolicy::new(1);

        let generation = policy
            .run("create", &sessions, |session| async move { Ok(session.generation()) })
            .await
            .unwrap();

        assert_eq!(generation, 1);
        assert_eq!(sessions.stale_generations(), vec![NO_GENERATION]);
    }

    #[tokio::test]
    async fn test_refresh_failure_propagates_its_own_error() {
        let sessions = CountingSessions::established()
            .failing_refresh(ForceLinkError::Authentication("bad password".into()));
        let policy = SessionRetryPolicy::new(3);

        let result: Result<()> = policy
            .run("delete", &sessions, |_session| async {
                Err(ForceLinkError::Session("stale".into()))
            })
            .await;

        assert_eq!(result, Err(ForceLinkError::Authentication("bad password".into())));
        assert_eq!(sessions.refreshes(), 1);
    }
}
