//! Public record operations

pub mod service;

pub use service::RecordService;
