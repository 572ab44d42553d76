//! Errors reported by the remote service
//!
//! Two shapes exist on the wire: per-item [`RemoteError`]s embedded in a
//! batch response, and call-level [`RemoteFault`]s raised instead of a
//! response.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One per-item error from a batch response.
///
/// Ordering is total: by message, then status code, then affected fields.
/// The field declaration order below defines it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RemoteError {
    pub message: String,
    pub status_code: String,
    #[serde(default)]
    pub affected_fields: BTreeSet<String>,
}

impl RemoteError {
    /// Error with no affected fields.
    pub fn new(status_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: status_code.into(),
            affected_fields: BTreeSet::new(),
        }
    }

    /// Fields the error applies to.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_fields.extend(fields.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status_code, self.message)
    }
}

/// Kind of a call-level fault raised by the remote stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Credentials rejected during login
    LoginRejected,
    /// Malformed or unknown record id
    InvalidId,
    /// Unknown field for the object type
    InvalidField,
    /// Unknown object type
    InvalidObjectType,
    /// Query cursor is unknown or expired
    InvalidQueryLocator,
    /// Query text does not parse
    MalformedQuery,
    /// The session handle is unknown or expired
    InvalidSession,
    /// The server failed unexpectedly; usually a stale session
    UnexpectedError,
    /// The call never completed (connection refused, reset, timed out)
    Transport,
}

impl FaultKind {
    /// Wire name of the fault code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoginRejected => "LOGIN_REJECTED",
            Self::InvalidId => "INVALID_ID",
            Self::InvalidField => "INVALID_FIELD",
            Self::InvalidObjectType => "INVALID_OBJECT_TYPE",
            Self::InvalidQueryLocator => "INVALID_QUERY_LOCATOR",
            Self::MalformedQuery => "MALFORMED_QUERY",
            Self::InvalidSession => "INVALID_SESSION",
            Self::UnexpectedError => "UNEXPECTED_ERROR",
            Self::Transport => "TRANSPORT",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Call-level fault raised by the remote stub instead of a response.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct RemoteFault {
    pub kind: FaultKind,
    pub message: String,
}

impl RemoteFault {
    /// Fault of `kind`.
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// The session handle is no longer accepted.
    pub fn invalid_session(message: impl Into<String>) -> Self {
        Self::new(FaultKind::InvalidSession, message)
    }

    /// Unclassified server-side failure.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(FaultKind::UnexpectedError, message)
    }

    /// The exchange itself failed.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Transport, message)
    }

    /// The login exchange refused the credentials.
    pub fn login_rejected(message: impl Into<String>) -> Self {
        Self::new(FaultKind::LoginRejected, message)
    }
}
