//! Authenticated session with the remote service

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Opaque session token issued by login.
///
/// `Debug` and `Display` never print the token.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionHandle(String);

impl SessionHandle {
    /// Wrap a token issued by login.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for attaching to outbound calls.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionHandle([REDACTED; {} chars])", self.0.len())
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Identity of the logged-in user as reported by login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub user_name: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub organization_id: Option<String>,
    pub organization_name: Option<String>,
    pub language: Option<String>,
    pub locale: Option<String>,
}

/// What a successful login exchange returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub handle: SessionHandle,
    /// Endpoint every subsequent call of this session must target
    pub server_url: Url,
    pub user: UserIdentity,
}

/// An established session.
///
/// Sessions are immutable. A refresh replaces the whole value with one of a
/// higher `generation`; a session is never partially valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    handle: SessionHandle,
    endpoint: Url,
    established_at: DateTime<Utc>,
    generation: u64,
    user: UserIdentity,
}

impl Session {
    /// Session from a successful login, tagged with its login generation.
    pub fn new(login: LoginResult, generation: u64) -> Self {
        Self {
            handle: login.handle,
            endpoint: login.server_url,
            established_at: Utc::now(),
            generation,
            user: login.user,
        }
    }

    /// Token attached to every data call.
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Server URL data calls go to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// When the login completed.
    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    /// Monotonically increasing per connector; each login bumps it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Identity the remote service reported at login.
    pub fn user(&self) -> &UserIdentity {
        &self.user
    }
}
