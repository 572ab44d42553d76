//! # ForceLink Domain
//!
//! Data model for the ForceLink record service client.
//!
//! This crate contains:
//! - Session, record and result types exchanged with the remote service
//! - The `ForceLinkError` taxonomy and the aggregated per-item failure type
//! - Client configuration and its defaults
//! - Domain constants
//!
//! ## Architecture
//! - Depends only on the foundation tier of `forcelink-common`
//! - No I/O, no async runtime
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::{ClientConfig, TransportOptions};
pub use errors::{AggregatedError, ArgumentError, ForceLinkError, Result};
pub use types::*;
pub use utils::batching::chunks;
