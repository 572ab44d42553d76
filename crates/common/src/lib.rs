//! Modular common utilities shared across ForceLink crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error classification, serde helpers
//! - `observability`: tracing instrumentation (not included by default)
//! - `runtime`: async infrastructure (retry executor, lifecycle)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod utils;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod lifecycle;
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{CommonError, ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use lifecycle::{Lifecycle, LifecycleStatus};
#[cfg(feature = "runtime")]
pub use resilience::{
    RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryOutcome, RetryPolicy,
};
#[cfg(feature = "foundation")]
pub use utils::serde::duration_millis;
