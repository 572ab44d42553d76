//! Background sync of local entities to the remote service

pub mod service;

pub use service::{SyncService, SyncServiceConfig, SyncTask, TaskId};
