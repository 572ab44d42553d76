//! # ForceLink Core
//!
//! Record operations against a session-based remote service - no
//! infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the remote stub and the session holder
//! - The batch executor and per-item error aggregation
//! - Session-refreshing retries and the `RecordService` facade
//!
//! ## Architecture Principles
//! - Depends on `forcelink-common` and `forcelink-domain` only
//! - No network or platform code; the wire protocol sits behind
//!   [`RemoteService`]
//! - All external dependencies via traits

pub mod batch;
pub mod records;
pub mod remote;
pub mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use batch::{BatchExecutor, BatchInput, ErrorAggregator};
pub use records::RecordService;
pub use remote::{LoginRequest, RemoteService};
pub use session::{SessionProvider, SessionRetryPolicy, NO_GENERATION};
