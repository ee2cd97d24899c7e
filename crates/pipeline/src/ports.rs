//! Seams between the cycle and the systems it talks to.

use async_trait::async_trait;

use owtenter_alerts::EmailError;
use owtenter_core::thresholds::Violation;
use owtenter_core::weather::WeatherResult;
use owtenter_db::{PersistError, PersistRecord};
use owtenter_owserver::OwError;

/// Opens the sensor network for one cycle. Failure is fatal.
#[async_trait]
pub trait NetworkConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn SensorNetwork>, OwError>;
}

/// Reads raw values by bus path. A failed read only affects that sensor.
#[async_trait]
pub trait SensorNetwork: Send + Sync {
    async fn read(&self, path: &str) -> Result<Vec<u8>, OwError>;
}

/// Supplies weather for the record. Never fails.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self) -> WeatherResult;
}

/// Delivers threshold alerts. Failures are logged and ignored by the cycle.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, violations: &[Violation]) -> Result<(), EmailError>;
}

/// Stores the cycle's record. Failure is fatal.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn persist(&self, record: &PersistRecord) -> Result<(), PersistError>;
}
