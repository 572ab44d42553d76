//! Common error types and classification utilities
//!
//! This module provides the error-handling infrastructure shared by every
//! ForceLink crate:
//!
//! 1. **`CommonError`**: infrastructure failures that are not specific to the
//!    remote record service: unreadable configuration, timed-out waits and
//!    cancelled background tasks.
//!
//! 2. **`ErrorClassification` trait**: a standard interface for classifying
//!    errors by retryability and severity. The retry executor in
//!    [`crate::resilience`] and the session retry policy in `forcelink-core`
//!    both consult it.
//!
//! 3. **`ErrorSeverity` enum**: a unified severity scale used when logging.
//!
//! ## Composition
//!
//! Domain errors embed `CommonError` instead of duplicating its variants:
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum ClientError {
//!     #[error("Session invalid: {0}")]
//!     Session(String),
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//!
//! impl ErrorClassification for ClientError {
//!     fn is_retryable(&self) -> bool {
//!         match self {
//!             Self::Session(_) => true,
//!             Self::Common(e) => e.is_retryable(),
//!         }
//!     }
//!     // ...
//! }
//! ```

use std::fmt;
use std::time::Duration;

/// Common error variants that appear across multiple modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Configuration-related errors
    Config { message: String, field: Option<String> },

    /// Serialization or deserialization errors
    Serialization { message: String, format: Option<String> },

    /// Timeout errors
    Timeout { operation: String, duration: Duration },

    /// Task cancellation (async)
    TaskCancelled { task_id: String, reason: Option<String> },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message, field } => {
                if let Some(field) = field {
                    write!(f, "Configuration error in field '{}': {}", field, message)
                } else {
                    write!(f, "Configuration error: {}", message)
                }
            }
            Self::Serialization { message, format } => {
                if let Some(format) = format {
                    write!(f, "Serialization error ({}): {}", format, message)
                } else {
                    write!(f, "Serialization error: {}", message)
                }
            }
            Self::Timeout { operation, duration } => {
                write!(f, "Operation '{}' timed out after {:?}", operation, duration)
            }
            Self::TaskCancelled { task_id, reason } => {
                if let Some(reason) = reason {
                    write!(f, "Task '{}' cancelled: {}", task_id, reason)
                } else {
                    write!(f, "Task '{}' cancelled", task_id)
                }
            }
        }
    }
}

impl std::error::Error for CommonError {}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config { .. } => ErrorSeverity::Critical,
            Self::Serialization { .. } => ErrorSeverity::Error,
            Self::Timeout { .. } => ErrorSeverity::Warning,
            Self::TaskCancelled { .. } => ErrorSeverity::Info,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl CommonError {
    /// Create a configuration error for a specific field
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Create a serialization error with format information
    pub fn serialization_format<S: Into<String>, F: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { message: message.into(), format: Some(format.into()) }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration: Duration) -> Self {
        Self::Timeout { operation: operation.into(), duration }
    }

    /// Create a task cancellation error with a reason
    pub fn task_cancelled_with_reason<S: Into<String>, R: Into<String>>(
        task_id: S,
        reason: R,
    ) -> Self {
        Self::TaskCancelled { task_id: task_id.into(), reason: Some(reason.into()) }
    }
}

/// Error classification trait for consistent error handling across modules
///
/// Retry decisions, log levels and alerting all go through this trait so
/// that a single `match` per error type decides how a failure is treated.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient conditions that may succeed if the
    /// operation is attempted again after recovery (for example an expired
    /// session that can be re-established).
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

// Standard conversions from common error types
impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_format("JSON", err.to_string())
    }
}

impl From<toml::de::Error> for CommonError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization_format("TOML", err.to_string())
    }
}
