//! Production implementations of the [`ports`](crate::ports) traits.

use std::time::Duration;

use async_trait::async_trait;

use owtenter_alerts::{EmailError, EmailNotifier};
use owtenter_core::config::OwServerConfig;
use owtenter_core::thresholds::Violation;
use owtenter_core::weather::WeatherResult;
use owtenter_db::{PersistError, PersistRecord, PersistenceWriter};
use owtenter_owserver::{OwError, OwProxy};
use owtenter_weather::WeatherEnricher;

use crate::ports::{AlertSink, NetworkConnector, RecordStore, SensorNetwork, WeatherSource};

/// Connects to the configured owserver.
pub struct OwServerConnector {
    host: String,
    port: u16,
    timeout: Duration,
}

impl OwServerConnector {
    pub fn new(config: &OwServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            timeout: config.read_timeout,
        }
    }
}

#[async_trait]
impl NetworkConnector for OwServerConnector {
    async fn connect(&self) -> Result<Box<dyn SensorNetwork>, OwError> {
        let proxy = OwProxy::connect(&self.host, self.port, self.timeout).await?;
        Ok(Box::new(proxy))
    }
}

#[async_trait]
impl SensorNetwork for OwProxy {
    async fn read(&self, path: &str) -> Result<Vec<u8>, OwError> {
        OwProxy::read(self, path).await
    }
}

#[async_trait]
impl WeatherSource for WeatherEnricher {
    async fn fetch(&self) -> WeatherResult {
        WeatherEnricher::fetch(self).await
    }
}

#[async_trait]
impl AlertSink for EmailNotifier {
    async fn notify(&self, violations: &[Violation]) -> Result<(), EmailError> {
        self.send(violations).await
    }
}

#[async_trait]
impl RecordStore for PersistenceWriter {
    async fn persist(&self, record: &PersistRecord) -> Result<(), PersistError> {
        PersistenceWriter::persist(self, record).await
    }
}
