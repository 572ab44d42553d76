//! Domain constants
//!
//! Centralized location for the defaults and limits of the remote record
//! service.

// Remote limits
/// Largest number of records the remote service accepts in one batch call.
/// Not enforced locally; see [`crate::chunks`].
pub const MAX_BATCH_SIZE: usize = 200;

// Client configuration defaults
/// Session refreshes allowed per call.
pub const DEFAULT_MAX_RETRIES: u32 = 1;
/// Deadline for every remote exchange, in milliseconds.
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 30_000;
/// A failed boot login fails initialization.
pub const DEFAULT_FAIL_ON_BOOT: bool = true;
/// Request compressed transfers.
pub const DEFAULT_COMPRESSION: bool = true;
/// Field upserts match on.
pub const DEFAULT_EXTERNAL_ID_FIELD: &str = "External_Id__c";

// Error rendering
/// Summary line of every aggregated per-item failure.
pub const REMOTE_OPERATION_FAILED: &str = "Remote operation failed";

// Environment
/// Prefix of every configuration environment variable.
pub const ENV_PREFIX: &str = "FORCELINK_";
