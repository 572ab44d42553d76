//! Error types used throughout the client

use std::fmt;
use std::time::Duration;

use forcelink_common::{CommonError, ErrorClassification, ErrorSeverity};
use thiserror::Error;

use crate::constants::REMOTE_OPERATION_FAILED;
use crate::types::{FaultKind, RemoteError, RemoteFault};

/// Main error type for ForceLink
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForceLinkError {
    /// Caller input violated a precondition; nothing was sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),

    /// Credentials were rejected at login
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The exchange did not complete or returned a malformed reply
    #[error("Transport error: {0}")]
    Transport(String),

    /// Session invalid or server fault; the only transient class
    #[error("Session error: {0}")]
    Session(String),

    /// A call-level fault that replaying will not fix
    #[error("Remote fault: {0}")]
    RemoteFault(RemoteFault),

    /// One or more items of a batch failed
    #[error(transparent)]
    RemoteOperationFailed(#[from] AggregatedError),

    /// Configuration is missing, unreadable or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The client cannot serve the call, e.g. after shutdown
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for ForceLink operations
pub type Result<T> = std::result::Result<T, ForceLinkError>;

impl ForceLinkError {
    /// Maps a call-level fault onto the taxonomy.
    ///
    /// Invalid-session and unexpected-server faults are the transient
    /// `Session` class; everything else is final.
    pub fn classify(fault: RemoteFault) -> Self {
        match fault.kind {
            FaultKind::InvalidSession | FaultKind::UnexpectedError => {
                Self::Session(fault.to_string())
            }
            FaultKind::LoginRejected => Self::Authentication(fault.to_string()),
            FaultKind::Transport => Self::Transport(fault.message),
            FaultKind::InvalidId
            | FaultKind::InvalidField
            | FaultKind::InvalidObjectType
            | FaultKind::InvalidQueryLocator
            | FaultKind::MalformedQuery => Self::RemoteFault(fault),
        }
    }

    /// Maps a fault raised by the login exchange. Anything but a transport
    /// failure means the credentials were not accepted.
    pub fn classify_login(fault: RemoteFault) -> Self {
        match fault.kind {
            FaultKind::Transport => Self::Transport(fault.message),
            _ => Self::Authentication(format!("Unable to log in: {fault}")),
        }
    }

    /// A call that did not complete within `after`.
    pub fn timeout(operation: &str, after: Duration) -> Self {
        Self::Transport(format!("{operation} timed out after {after:?}"))
    }

    /// The transient error raised while no session is established.
    pub fn no_session() -> Self {
        Self::Session("no session established".to_string())
    }

    /// The aggregated per-item failure, when this is one.
    pub fn aggregated(&self) -> Option<&AggregatedError> {
        match self {
            Self::RemoteOperationFailed(aggregate) => Some(aggregate),
            _ => None,
        }
    }
}

impl From<RemoteFault> for ForceLinkError {
    fn from(fault: RemoteFault) -> Self {
        Self::classify(fault)
    }
}

impl From<CommonError> for ForceLinkError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::Config { .. } | CommonError::Serialization { .. } => {
                Self::Config(err.to_string())
            }
            CommonError::Timeout { .. } => Self::Transport(err.to_string()),
            CommonError::TaskCancelled { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl ErrorClassification for ForceLinkError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Session(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Session(_) => ErrorSeverity::Warning,
            Self::InvalidArgument(_)
            | Self::Transport(_)
            | Self::RemoteFault(_)
            | Self::RemoteOperationFailed(_) => ErrorSeverity::Error,
            Self::Authentication(_) | Self::Config(_) | Self::Internal(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::Config(_) | Self::Internal(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Precondition violations on caller input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// The argument was absent
    #[error("{0} must not be null")]
    Null(&'static str),

    /// The collection had no items
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// The string was empty or whitespace
    #[error("{0} must not be blank")]
    Blank(&'static str),

    /// A record that needs an id has none
    #[error("record at index {index} has no identifier")]
    MissingIdentifier { index: usize },
}

/// All per-item errors of a failed batch, in one deterministic order.
///
/// Errors are sorted by message, then status code, then affected fields.
/// Nothing is dropped or merged: duplicates stay duplicates. A call that
/// fails as a whole is reported through [`ForceLinkError::Transport`] or
/// [`ForceLinkError::RemoteFault`], never as an aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedError {
    errors: Vec<RemoteError>,
}

impl AggregatedError {
    /// Sorts `errors` into their rendering order.
    pub fn new(mut errors: Vec<RemoteError>) -> Self {
        errors.sort();
        Self { errors }
    }

    /// The per-item errors, sorted.
    pub fn errors(&self) -> &[RemoteError] {
        &self.errors
    }

    /// Number of per-item errors, duplicates included.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no per-item error was collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Summary line every rendering starts with.
    pub fn description(&self) -> &'static str {
        REMOTE_OPERATION_FAILED
    }
}

impl fmt::Display for AggregatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => f.write_str(self.description()),
            [single] => write!(f, "{}: {}", self.description(), single),
            many => {
                f.write_str(self.description())?;
                for error in many {
                    write!(f, "\n{error}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for AggregatedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_display_forms() {
        assert_eq!(AggregatedError::new(vec![]).to_string(), "Remote operation failed");

        let one = AggregatedError::new(vec![RemoteError::new("NOT_FOUND", "no such id")]);
        assert_eq!(one.to_string(), "Remote operation failed: NOT_FOUND no such id");

        let many = AggregatedError::new(vec![
            RemoteError::new("REQUIRED_FIELD_MISSING", "Name is required"),
            RemoteError::new("DUPLICATE_VALUE", "Email already used"),
        ]);
        assert_eq!(
            many.to_string(),
            "Remote operation failed\nDUPLICATE_VALUE Email already used\n\
             REQUIRED_FIELD_MISSING Name is required"
        );
    }

    /// Same multiset of errors in a different order renders identically.
    #[test]
    fn test_aggregate_is_order_independent() {
        let a = RemoteError::new("B", "m1");
        let b = RemoteError::new("A", "m2").with_fields(["Phone"]);
        let c = RemoteError::new("A", "m2");

        let first = AggregatedError::new(vec![a.clone(), b.clone(), c.clone()]);
        let second = AggregatedError::new(vec![c, a, b]);

        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_aggregate_keeps_duplicates() {
        let dup = RemoteError::new("X", "same");
        let aggregate = AggregatedError::new(vec![dup.clone(), dup.clone(), dup]);
        assert_eq!(aggregate.len(), 3);
    }

    #[test]
    fn test_fault_classification() {
        assert!(matches!(
            ForceLinkError::from(RemoteFault::invalid_session("expired")),
            ForceLinkError::Session(_)
        ));
        assert!(matches!(
            ForceLinkError::from(RemoteFault::unexpected("boom")),
            ForceLinkError::Session(_)
        ));
        assert!(matches!(
            ForceLinkError::from(RemoteFault::new(FaultKind::MalformedQuery, "bad")),
            ForceLinkError::RemoteFault(_)
        ));
        assert_eq!(
            ForceLinkError::from(RemoteFault::transport("refused")),
            ForceLinkError::Transport("refused".into())
        );
        assert!(matches!(
            ForceLinkError::classify_login(RemoteFault::unexpected("boom")),
            ForceLinkError::Authentication(_)
        ));
        assert!(matches!(
            ForceLinkError::classify_login(RemoteFault::transport("refused")),
            ForceLinkError::Transport(_)
        ));
    }

    #[test]
    fn test_only_session_is_retryable() {
        assert!(ForceLinkError::no_session().is_retryable());
        assert!(!ForceLinkError::Transport("x".into()).is_retryable());
        assert!(!ForceLinkError::Authentication("x".into()).is_retryable());
        assert!(!ForceLinkError::from(ArgumentError::Empty("records")).is_retryable());
        assert!(!ForceLinkError::from(AggregatedError::new(vec![])).is_retryable());
        assert!(ForceLinkError::Authentication("x".into()).is_critical());
    }

    #[test]
    fn test_argument_error_display() {
        assert_eq!(
            ForceLinkError::from(ArgumentError::Null("records")).to_string(),
            "Invalid argument: records must not be null"
        );
        assert_eq!(
            ArgumentError::MissingIdentifier { index: 2 }.to_string(),
            "record at index 2 has no identifier"
        );
    }

    #[test]
    fn test_remote_operation_failed_is_transparent() {
        let err = ForceLinkError::from(AggregatedError::new(vec![RemoteError::new(
            "NOT_FOUND",
            "no such id",
        )]));
        assert_eq!(err.to_string(), "Remote operation failed: NOT_FOUND no such id");
        assert_eq!(err.aggregated().map(AggregatedError::len), Some(1));
    }
}
