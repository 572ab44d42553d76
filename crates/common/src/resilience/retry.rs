//! Generic retry executor with a recovery hook between attempts
//!
//! The executor replays an async operation while its [`RetryPolicy`] says the
//! failure is worth retrying and the attempt budget allows it. Before every
//! replay a recovery step runs (for example re-establishing a remote
//! session); a failing recovery ends the sequence with its own error.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::error::ErrorClassification;

/// Errors that can occur during retry operations
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All retry attempts have been exhausted; carries the last failure
    #[error("All retry attempts exhausted after {attempts} tries: {error:?}")]
    AttemptsExhausted {
        /// Attempts made, the first one included
        attempts: u32,
        /// Error of the last attempt
        error: E,
    },

    /// The operation failed with a non-retryable error
    #[error("Operation failed with non-retryable error: {error:?}")]
    NonRetryable {
        /// The error the policy declined
        error: E,
    },

    /// The recovery step between two attempts failed
    #[error("Recovery before attempt {attempt} failed: {error:?}")]
    RecoveryFailed {
        /// The attempt the recovery was preparing
        attempt: u32,
        /// Error returned by the recovery step
        error: E,
    },
}

impl<E> RetryError<E> {
    /// The operation or recovery error that ended the sequence.
    pub fn into_source(self) -> E {
        match self {
            Self::AttemptsExhausted { error, .. }
            | Self::NonRetryable { error }
            | Self::RecoveryFailed { error, .. } => error,
        }
    }
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Outcome of a retry execution including result and summary statistics.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Value of the successful attempt, or the error that ended the sequence.
    pub result: RetryResult<T, E>,
    /// Attempts made, the first one included.
    pub attempts: u32,
    /// Number of recovery steps that ran (successful or not).
    pub recoveries: u32,
    /// Time slept between attempts.
    pub total_delay: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> RetryResult<T, E> {
        self.result
    }
}

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Determine if the error should be retried and optionally provide a custom
    /// delay
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation immediately
    Retry,
    /// Retry the operation after a delay
    RetryAfter(Duration),
    /// Don't retry the operation
    Stop,
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
}

impl RetryConfig {
    /// Replays bounded by a number of retries after the first attempt. `0`
    /// means the operation runs exactly once.
    pub fn immediate(max_retries: u32) -> Self {
        Self { max_attempts: max_retries.saturating_add(1) }
    }
}

/// The main retry executor
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    /// Create a new retry executor with the given configuration and policy
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    /// Execute an operation, running `recover` before every replay.
    ///
    /// `recover` runs only when the policy asked for a retry and the attempt
    /// budget is not exhausted, so the number of recoveries is always one less
    /// than the number of attempts on a fully failing sequence.
    #[instrument(skip_all, fields(max_attempts = self.config.max_attempts))]
    pub async fn execute_with_recovery<F, Fut, R, RFut, T, E>(
        &self,
        mut operation: F,
        mut recover: R,
    ) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: FnMut() -> RFut,
        RFut: Future<Output = Result<(), E>>,
    {
        let mut attempt: u32 = 0;
        let mut recoveries: u32 = 0;
        let mut total_delay = Duration::ZERO;

        let finish = |result, attempts, recoveries, total_delay| RetryOutcome {
            result,
            attempts,
            recoveries,
            total_delay,
        };

        loop {
            let attempt_number = attempt + 1;
            debug!(attempt = attempt_number, max = self.config.max_attempts, "executing operation");

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "operation succeeded after retries");
                    }
                    return finish(Ok(value), attempt_number, recoveries, total_delay);
                }
                Err(error) => error,
            };

            let delay = match self.policy.should_retry(&error, attempt) {
                RetryDecision::Stop => {
                    debug!(?error, "retry policy declined to retry");
                    return finish(
                        Err(RetryError::NonRetryable { error }),
                        attempt_number,
                        recoveries,
                        total_delay,
                    );
                }
                RetryDecision::Retry => Duration::ZERO,
                RetryDecision::RetryAfter(delay) => delay,
            };

            if attempt_number >= self.config.max_attempts {
                warn!(attempts = attempt_number, ?error, "all retry attempts exhausted");
                return finish(
                    Err(RetryError::AttemptsExhausted { attempts: attempt_number, error }),
                    attempt_number,
                    recoveries,
                    total_delay,
                );
            }

            warn!(attempt = attempt_number, ?delay, ?error, "operation failed, recovering before retry");

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
                total_delay += delay;
            }

            recoveries += 1;
            if let Err(error) = recover().await {
                warn!(attempt = attempt_number, ?error, "recovery failed");
                return finish(
                    Err(RetryError::RecoveryFailed { attempt: attempt_number + 1, error }),
                    attempt_number,
                    recoveries,
                    total_delay,
                );
            }

            attempt += 1;
        }
    }
}

/// Pre-defined retry policies
pub mod policies {
    use super::{ErrorClassification, RetryDecision, RetryPolicy};

    /// Retries exactly the errors that classify themselves as retryable,
    /// honouring any `retry_after` hint.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ClassifiedRetry;

    impl<E: ErrorClassification> RetryPolicy<E> for ClassifiedRetry {
        fn should_retry(&self, error: &E, _attempt: u32) -> RetryDecision {
            if !error.is_retryable() {
                return RetryDecision::Stop;
            }
            match error.retry_after() {
                Some(delay) => RetryDecision::RetryAfter(delay),
                None => RetryDecision::Retry,
            }
        }
    }
}
