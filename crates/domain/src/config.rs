//! Client configuration

use std::fmt;
use std::time::Duration;

use forcelink_common::duration_millis;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    DEFAULT_COMPRESSION, DEFAULT_CONNECTION_TIMEOUT_MS, DEFAULT_EXTERNAL_ID_FIELD,
    DEFAULT_FAIL_ON_BOOT, DEFAULT_MAX_RETRIES,
};
use crate::errors::{ForceLinkError, Result};

/// Connection and behaviour settings for one remote endpoint.
///
/// `Debug` redacts the password and security token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Login endpoint (service description or login URL)
    pub endpoint: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub security_token: String,
    /// Bound on every outbound call, login included
    #[serde(with = "duration_millis", default = "default_connection_timeout")]
    pub connection_timeout: Duration,
    /// Session refreshes allowed per operation
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Whether a failed login during `initialize` is fatal
    #[serde(default = "default_fail_on_boot")]
    pub fail_on_boot: bool,
    /// Field used to match records on upsert
    #[serde(default = "default_external_id_field")]
    pub external_id_field: String,
    /// Request gzip compression on the connection
    #[serde(default = "default_compression")]
    pub compression: bool,
}

fn default_connection_timeout() -> Duration {
    Duration::from_millis(DEFAULT_CONNECTION_TIMEOUT_MS)
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_fail_on_boot() -> bool {
    DEFAULT_FAIL_ON_BOOT
}

fn default_external_id_field() -> String {
    DEFAULT_EXTERNAL_ID_FIELD.to_string()
}

fn default_compression() -> bool {
    DEFAULT_COMPRESSION
}

impl ClientConfig {
    /// Configuration with every optional setting at its default.
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            security_token: String::new(),
            connection_timeout: default_connection_timeout(),
            max_retries: default_max_retries(),
            fail_on_boot: default_fail_on_boot(),
            external_id_field: default_external_id_field(),
            compression: default_compression(),
        }
    }

    /// Token appended to the password at login.
    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = token.into();
        self
    }

    /// Session refreshes allowed per call.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Deadline for every remote exchange.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Whether a failed boot login fails initialization.
    pub fn with_fail_on_boot(mut self, fail_on_boot: bool) -> Self {
        self.fail_on_boot = fail_on_boot;
        self
    }

    /// Field upserts match on.
    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field = field.into();
        self
    }

    /// The secret presented at login: password followed by security token.
    pub fn login_secret(&self) -> String {
        format!("{}{}", self.password, self.security_token)
    }

    /// Transport settings handed to the remote stub.
    pub fn transport(&self) -> TransportOptions {
        TransportOptions { timeout: self.connection_timeout, compression: self.compression }
    }

    /// Checks the settings that cannot be defaulted.
    ///
    /// # Errors
    /// Returns `ForceLinkError::Config` for an empty or unparsable endpoint,
    /// an empty username, a blank external-id field or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ForceLinkError::Config("endpoint must not be empty".to_string()));
        }
        Url::parse(&self.endpoint)
            .map_err(|e| ForceLinkError::Config(format!("invalid endpoint: {e}")))?;
        if self.username.trim().is_empty() {
            return Err(ForceLinkError::Config("username must not be empty".to_string()));
        }
        if self.external_id_field.trim().is_empty() {
            return Err(ForceLinkError::Config("externalIdField must not be blank".to_string()));
        }
        if self.connection_timeout.is_zero() {
            return Err(ForceLinkError::Config(
                "connectionTimeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("security_token", &"[REDACTED]")
            .field("connection_timeout", &self.connection_timeout)
            .field("max_retries", &self.max_retries)
            .field("fail_on_boot", &self.fail_on_boot)
            .field("external_id_field", &self.external_id_field)
            .field("compression", &self.compression)
            .finish()
    }
}

/// Connection-scoped transport parameters handed to the remote stub at
/// login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    pub timeout: Duration,
    pub compression: bool,
}
