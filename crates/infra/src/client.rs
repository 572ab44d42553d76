//! Client wiring
//!
//! Ties a [`Connector`] and a [`RecordService`] to one remote stub and one
//! configuration.

use std::sync::Arc;

use async_trait::async_trait;
use forcelink_common::{Lifecycle, LifecycleStatus};
use forcelink_core::{RecordService, RemoteService};
use forcelink_domain::{ClientConfig, ForceLinkError, Result};

use crate::config;
use crate::session::Connector;

/// A connected record client.
///
/// `initialize` performs the boot login; `shutdown` logs out.
pub struct ForceLinkClient {
    connector: Arc<Connector>,
    records: RecordService,
}

impl ForceLinkClient {
    /// # Errors
    /// `ForceLinkError::Config` when `config` does not validate.
    pub fn new(remote: Arc<dyn RemoteService>, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let records_config = config.clone();
        let connector = Arc::new(Connector::new(remote.clone(), config));
        let records = RecordService::new(remote, connector.clone(), &records_config);
        Ok(Self { connector, records })
    }

    /// Build a client from the environment or a config file.
    pub fn from_env(remote: Arc<dyn RemoteService>) -> Result<Self> {
        Self::new(remote, config::load()?)
    }

    /// Record operations.
    pub fn records(&self) -> &RecordService {
        &self.records
    }

    /// The session holder behind every call.
    pub fn connector(&self) -> &Arc<Connector> {
        &self.connector
    }
}

#[async_trait]
impl Lifecycle for ForceLinkClient {
    type Error = ForceLinkError;

    async fn initialize(&self) -> Result<()> {
        self.connector.initialize().await
    }

    async fn shutdown(&self) {
        self.connector.shutdown().await;
    }

    fn status(&self) -> LifecycleStatus {
        self.connector.status()
    }
}
