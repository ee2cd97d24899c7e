use owtenter_db::PersistError;
use owtenter_owserver::OwError;

use crate::orchestrator::Stage;

/// A fatal cycle failure. Every variant means the process exits non-zero.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Sensor network unavailable: {0}")]
    SensorNetwork(#[source] OwError),

    #[error("No sensors were successfully read")]
    NoReadings,

    #[error("Persisting the record failed: {0}")]
    Persistence(#[from] PersistError),
}

impl PipelineError {
    /// The stage the cycle was aborted in.
    pub fn stage(&self) -> Stage {
        match self {
            Self::SensorNetwork(_) => Stage::ConnectSensorNetwork,
            Self::NoReadings => Stage::NoDataCheck,
            Self::Persistence(_) => Stage::Persist,
        }
    }
}
