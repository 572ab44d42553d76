//! Subscriber installation
//!
//! `RUST_LOG` takes precedence over the default directive. Output goes to
//! stderr, either compact text or one JSON object per event.

use std::fmt;
use std::str::FromStr;

use forcelink_domain::constants::ENV_PREFIX;
use forcelink_domain::{ForceLinkError, Result};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Rendering of log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable compact lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Read `FORCELINK_LOG_FORMAT`, falling back to text.
    pub fn from_env() -> Self {
        std::env::var(format!("{ENV_PREFIX}LOG_FORMAT"))
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for LogFormat {
    type Err = ForceLinkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" | "compact" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ForceLinkError::Config(format!("unknown log format: {other}"))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Install the global subscriber with the default directive.
///
/// # Errors
/// Returns `ForceLinkError::Config` if a global subscriber is already set.
pub fn init_logging(format: LogFormat) -> Result<()> {
    init_logging_with(format, DEFAULT_DIRECTIVE)
}

/// Install the global subscriber, using `default_directive` when `RUST_LOG`
/// is unset.
pub fn init_logging_with(format: LogFormat, default_directive: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

    let installed = match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(stderr)
            .with_target(true)
            .compact()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(stderr)
            .json()
            .with_current_span(true)
            .try_init(),
    };

    installed.map_err(|e| ForceLinkError::Config(format!("failed to install log subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" compact ".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!(matches!("xml".parse::<LogFormat>(), Err(ForceLinkError::Config(_))));
        assert_eq!(LogFormat::default().to_string(), "text");
    }

    #[test]
    fn test_second_install_is_rejected() {
        let first = init_logging(LogFormat::Text);
        let second = init_logging(LogFormat::Json);

        // Another test may have installed a subscriber first; either way the
        // later call cannot succeed.
        assert!(first.is_ok() || matches!(first, Err(ForceLinkError::Config(_))));
        assert!(matches!(second, Err(ForceLinkError::Config(_))));
    }
}
