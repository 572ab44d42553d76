//! Observability bootstrap
//!
//! Events and spans are emitted with `tracing` throughout the workspace;
//! this module installs the subscriber that renders them.

pub mod logging;

pub use logging::{init_logging, init_logging_with, LogFormat, DEFAULT_DIRECTIVE};
