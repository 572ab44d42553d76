//! Domain utilities

pub mod batching;
