//! # ForceLink Infrastructure
//!
//! Runtime pieces around the record operations in `forcelink-core`.
//!
//! This crate contains:
//! - The session-owning [`Connector`]
//! - Configuration loading from the environment and files
//! - Logging bootstrap
//! - A background sync service
//!
//! ## Architecture
//! - Implements the `SessionProvider` port defined in `forcelink-core`
//! - The wire protocol stays behind the `RemoteService` port, supplied by
//!   the caller

pub mod client;
pub mod config;
pub mod observability;
pub mod session;
pub mod sync;

// Re-export commonly used items
pub use client::ForceLinkClient;
pub use observability::{init_logging, LogFormat};
pub use session::Connector;
pub use sync::{SyncService, SyncServiceConfig};
