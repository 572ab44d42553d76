//! Resilience patterns for fault tolerance
//!
//! Generic retry logic, independent of any particular remote service. The
//! executor is generic over the error type and lets the caller plug in a
//! recovery step (such as refreshing a session) that runs between attempts.

pub mod retry;

pub use retry::{
    policies, RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryOutcome, RetryPolicy,
    RetryResult,
};
