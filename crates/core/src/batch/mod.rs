//! Batch operations against the remote service
//!
//! - **[`input`]**: presence and emptiness checks on caller input
//! - **[`aggregator`]**: folds per-item failures into one error
//! - **[`executor`]**: issues calls and classifies per-item results

pub mod aggregator;
pub mod executor;
pub mod input;

pub use aggregator::ErrorAggregator;
pub use executor::BatchExecutor;
pub use input::{require, BatchInput};
