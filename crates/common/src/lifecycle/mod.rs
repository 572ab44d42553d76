//! Lifecycle management for long-lived async components
//!
//! Components that own remote resources (a session, a task set) implement
//! [`Lifecycle`] so that callers boot and tear them down the same way.

use std::fmt;

use async_trait::async_trait;

/// Standard lifecycle trait for components owning remote or background
/// resources.
///
/// `shutdown` is best-effort: implementations log teardown problems instead
/// of returning them, so the trait only surfaces errors from `initialize`.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Error type returned when initialization fails
    type Error: std::error::Error + Send + Sync + 'static;

    /// Acquire the resources the component needs to operate
    async fn initialize(&self) -> Result<(), Self::Error>;

    /// Release resources; never fails
    async fn shutdown(&self);

    /// Current lifecycle status
    fn status(&self) -> LifecycleStatus;
}

/// Lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStatus {
    /// Created but not initialized
    Created,
    /// Initialization in progress
    Initializing,
    /// Running and operational
    Running,
    /// Running without the resources initialization should have acquired;
    /// they are acquired lazily on first use
    Degraded,
    /// Shutting down
    ShuttingDown,
    /// Shut down
    Shutdown,
    /// Initialization failed
    Error,
}

impl LifecycleStatus {
    /// Whether the component accepts work in this status
    pub fn is_operational(self) -> bool {
        matches!(self, Self::Running | Self::Degraded)
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Initializing => write!(f, "Initializing"),
            Self::Running => write!(f, "Running"),
            Self::Degraded => write!(f, "Degraded"),
            Self::ShuttingDown => write!(f, "Shutting Down"),
            Self::Shutdown => write!(f, "Shutdown"),
            Self::Error => write!(f, "Error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_and_operational() {
        assert_eq!(LifecycleStatus::ShuttingDown.to_string(), "Shutting Down");
        assert!(LifecycleStatus::Running.is_operational());
        assert!(LifecycleStatus::Degraded.is_operational());
        assert!(!LifecycleStatus::Created.is_operational());
        assert!(!LifecycleStatus::Shutdown.is_operational());
    }
}
