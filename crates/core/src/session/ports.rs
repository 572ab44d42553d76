//! Port interface for the session holder

use std::sync::Arc;

use async_trait::async_trait;
use forcelink_domain::{Result, Session};

/// Generation value meaning "no session was observed".
///
/// Real sessions start at generation 1.
pub const NO_GENERATION: u64 = 0;

/// Owner of the current session.
///
/// Only these two operations touch the shared session; both are atomic with
/// respect to each other.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The cached session, without validity checks.
    ///
    /// # Errors
    /// `ForceLinkError::Session` when no session is established.
    async fn current_session(&self) -> Result<Arc<Session>>;

    /// Replace the session of generation `stale_generation`.
    ///
    /// When a newer session already replaced it, that session is returned
    /// and no login happens. Pass [`NO_GENERATION`] when no session was seen.
    async fn refresh_after(&self, stale_generation: u64) -> Result<Arc<Session>>;
}
