//! Session holder backed by the remote login exchange
//!
//! The [`Connector`] owns the only mutable shared state of the client: the
//! current [`Session`]. Reads go through an `RwLock` and hand out the cached
//! `Arc`; logins are serialised by a separate async mutex so that a burst of
//! concurrent refresh requests performs a single login. Requests queued behind
//! a failed login share its error instead of logging in again.
//!
//! Once shut down, the connector never logs in again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use forcelink_common::{Lifecycle, LifecycleStatus};
use forcelink_core::{LoginRequest, RemoteService, SessionProvider, NO_GENERATION};
use forcelink_domain::{ClientConfig, ForceLinkError, Result, Session};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Establishes, caches and refreshes the session used by every remote call.
pub struct Connector {
    remote: Arc<dyn RemoteService>,
    config: ClientConfig,
    session: RwLock<Option<Arc<Session>>>,
    /// Serialises logins; holds the error of the last attempt if it failed.
    refresh_lock: Mutex<Option<ForceLinkError>>,
    /// Completed login attempts, successful or not.
    attempts: AtomicU64,
    generation: AtomicU64,
    status: RwLock<LifecycleStatus>,
}

impl Connector {
    /// Connector with no session; call `connect` or `initialize` to log in.
    pub fn new(remote: Arc<dyn RemoteService>, config: ClientConfig) -> Self {
        Self {
            remote,
            config,
            session: RwLock::new(None),
            refresh_lock: Mutex::new(None),
            attempts: AtomicU64::new(0),
            generation: AtomicU64::new(NO_GENERATION),
            status: RwLock::new(LifecycleStatus::Created),
        }
    }

    /// Configuration the connector logs in with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Log in and replace the cached session.
    ///
    /// # Errors
    /// `Authentication` when the credentials are rejected, `Transport` when
    /// the exchange cannot complete within the connection timeout,
    /// `Internal` after shutdown.
    #[instrument(skip(self), fields(username = %self.config.username))]
    pub async fn connect(&self) -> Result<Arc<Session>> {
        let mut last_failure = self.refresh_lock.lock().await;
        self.login(&mut last_failure).await
    }

    /// Discard the current session and log in again.
    pub async fn refresh(&self) -> Result<Arc<Session>> {
        let stale = self.session.read().as_ref().map_or(NO_GENERATION, |s| s.generation());
        self.refresh_after(stale).await
    }

    /// The cached session, if one is established.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.read().clone()
    }

    /// Generation of the most recent login; `NO_GENERATION` before the first.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        match *self.status.read() {
            LifecycleStatus::ShuttingDown | LifecycleStatus::Shutdown => {
                Err(ForceLinkError::Internal("connector is shut down".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Run one login attempt. Must be called with `refresh_lock` held.
    async fn login(&self, last_failure: &mut Option<ForceLinkError>) -> Result<Arc<Session>> {
        self.ensure_open()?;
        let result = self.exchange().await;
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match result {
            Ok(session) => {
                *last_failure = None;
                Ok(session)
            }
            Err(error) => {
                *last_failure = Some(error.clone());
                Err(error)
            }
        }
    }

    async fn exchange(&self) -> Result<Arc<Session>> {
        let secret = self.config.login_secret();
        let request = LoginRequest {
            endpoint: &self.config.endpoint,
            username: &self.config.username,
            secret: &secret,
            transport: self.config.transport(),
        };

        let timeout = self.config.connection_timeout;
        let login = match tokio::time::timeout(timeout, self.remote.login(request)).await {
            Ok(Ok(login)) => login,
            Ok(Err(fault)) => {
                let error = ForceLinkError::classify_login(fault);
                warn!(%error, "login failed");
                return Err(error);
            }
            Err(_) => {
                warn!(?timeout, "login timed out");
                return Err(ForceLinkError::timeout("login", timeout));
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session = Arc::new(Session::new(login, generation));
        let user = session.user();
        debug!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            full_name = user.full_name.as_deref().unwrap_or_default(),
            organization_id = user.organization_id.as_deref().unwrap_or_default(),
            organization_name = user.organization_name.as_deref().unwrap_or_default(),
            server_url = %session.endpoint(),
            "logged in"
        );
        info!(generation, "session established");

        *self.session.write() = Some(session.clone());
        let mut status = self.status.write();
        if *status == LifecycleStatus::Degraded {
            *status = LifecycleStatus::Running;
        }
        Ok(session)
    }
}

#[async_trait]
impl SessionProvider for Connector {
    async fn current_session(&self) -> Result<Arc<Session>> {
        self.ensure_open()?;
        self.session.read().clone().ok_or_else(ForceLinkError::no_session)
    }

    #[instrument(skip(self))]
    async fn refresh_after(&self, stale_generation: u64) -> Result<Arc<Session>> {
        let seen_attempts = self.attempts.load(Ordering::SeqCst);
        let mut last_failure = self.refresh_lock.lock().await;
        self.ensure_open()?;

        let current = self.session.read().clone();
        if let Some(current) = current {
            if current.generation() > stale_generation {
                debug!(generation = current.generation(), "session already refreshed");
                return Ok(current);
            }
        }

        if self.attempts.load(Ordering::SeqCst) > seen_attempts {
            if let Some(error) = last_failure.as_ref() {
                debug!(%error, "login failed while waiting, not retrying it");
                return Err(error.clone());
            }
        }

        self.session.write().take();
        self.login(&mut last_failure).await
    }
}

#[async_trait]
impl Lifecycle for Connector {
    type Error = ForceLinkError;

    /// Establish the first session.
    ///
    /// With `fail_on_boot` unset a login failure only degrades the
    /// connector; the first retried call establishes the session instead.
    #[instrument(skip(self))]
    async fn initialize(&self) -> Result<()> {
        self.ensure_open()?;
        *self.status.write() = LifecycleStatus::Initializing;
        match self.connect().await {
            Ok(_) => {
                *self.status.write() = LifecycleStatus::Running;
                Ok(())
            }
            Err(error) if self.config.fail_on_boot => {
                *self.status.write() = LifecycleStatus::Error;
                Err(error)
            }
            Err(error) => {
                warn!(%error, "initial login failed, continuing without a session");
                *self.status.write() = LifecycleStatus::Degraded;
                Ok(())
            }
        }
    }

    #[instrument(skip(self))]
    async fn shutdown(&self) {
        *self.status.write() = LifecycleStatus::ShuttingDown;
        let _guard = self.refresh_lock.lock().await;
        let session = self.session.write().take();
        if let Some(session) = session {
            let timeout = self.config.connection_timeout;
            match tokio::time::timeout(timeout, self.remote.logout(&session)).await {
                Ok(Ok(())) => info!(generation = session.generation(), "logged out"),
                Ok(Err(fault)) => warn!(%fault, "logout failed"),
                Err(_) => warn!(?timeout, "logout timed out"),
            }
        }
        *self.status.write() = LifecycleStatus::Shutdown;
    }

    fn status(&self) -> LifecycleStatus {
        *self.status.read()
    }
}
