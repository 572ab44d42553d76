//! Remote record service boundary

pub mod ports;

pub use ports::{LoginRequest, RemoteService};
