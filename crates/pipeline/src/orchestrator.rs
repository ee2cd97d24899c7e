//! One poll cycle, start to finish.

use std::fmt;

use chrono::Utc;

use owtenter_core::config::PipelineConfig;
use owtenter_core::normalize::normalize_all;
use owtenter_core::reading::ReadingSet;
use owtenter_core::thresholds::{evaluate, Violation};
use owtenter_core::weather::WeatherResult;
use owtenter_db::PersistRecord;

use crate::error::PipelineError;
use crate::ports::{AlertSink, NetworkConnector, RecordStore, WeatherSource};
use crate::reader::SensorReader;

/// Cycle stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ConnectSensorNetwork,
    ReadAll,
    RetryFailed,
    Normalize,
    NoDataCheck,
    FetchWeather,
    Evaluate,
    Notify,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConnectSensorNetwork => "connect_sensor_network",
            Self::ReadAll => "read_all",
            Self::RetryFailed => "retry_failed",
            Self::Normalize => "normalize",
            Self::NoDataCheck => "no_data_check",
            Self::FetchWeather => "fetch_weather",
            Self::Evaluate => "evaluate",
            Self::Notify => "notify",
            Self::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// What happened to the alert for this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    /// No threshold was crossed.
    NotNeeded,
    Sent,
    /// Thresholds were crossed but no mail transport is configured.
    NotConfigured,
    /// Delivery failed; the cycle carried on.
    Failed,
}

/// Summary of a completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub readings: ReadingSet,
    pub violations: Vec<Violation>,
    pub weather: Option<WeatherResult>,
    pub alert: AlertOutcome,
    /// Configured sensors missing from this cycle's readings.
    pub missing: Vec<String>,
    /// Stages entered, in order.
    pub stages: Vec<Stage>,
}

/// Wires the collaborators for one cycle.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    network: &'a dyn NetworkConnector,
    store: &'a dyn RecordStore,
    weather: Option<&'a dyn WeatherSource>,
    alerts: Option<&'a dyn AlertSink>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        network: &'a dyn NetworkConnector,
        store: &'a dyn RecordStore,
    ) -> Self {
        Self {
            config,
            network,
            store,
            weather: None,
            alerts: None,
        }
    }

    /// Enrich records with weather. Without this the record has no
    /// `weather` column.
    pub fn with_weather(mut self, weather: &'a dyn WeatherSource) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn with_alerts(mut self, alerts: &'a dyn AlertSink) -> Self {
        self.alerts = Some(alerts);
        self
    }

    /// Run one cycle. Returns an error only for the fatal stages:
    /// connecting to the sensor network, having no readings, and persisting.
    pub async fn run_cycle(&self) -> Result<CycleReport, PipelineError> {
        tracing::info!(sensors = self.config.sensors.len(), "Starting poll cycle");
        let mut stages = StageTrace::default();

        stages.enter(Stage::ConnectSensorNetwork);
        let network = self.network.connect().await.map_err(|e| {
            tracing::error!(error = %e, "Cannot reach the sensor network");
            PipelineError::SensorNetwork(e)
        })?;

        stages.enter(Stage::ReadAll);
        let reader = SensorReader::new(network.as_ref(), &self.config.owserver);
        let mut pass = reader.first_pass(&self.config.sensors).await;
        if pass.needs_retry() {
            stages.enter(Stage::RetryFailed);
            pass = reader.retry_failed(pass).await;
        }
        let outcome = pass.into_outcome();
        let captured_at = Utc::now();

        stages.enter(Stage::Normalize);
        let readings = ReadingSet::new(normalize_all(&outcome.raw), captured_at);

        stages.enter(Stage::NoDataCheck);
        if readings.is_empty() {
            tracing::error!(
                configured = self.config.sensors.len(),
                "No sensor produced a usable reading",
            );
            return Err(PipelineError::NoReadings);
        }
        let missing: Vec<String> = self
            .config
            .sensors
            .iter()
            .filter(|spec| readings.get(&spec.id).is_none())
            .map(|spec| spec.id.clone())
            .collect();

        let weather = match self.weather {
            Some(source) => {
                stages.enter(Stage::FetchWeather);
                let result = source.fetch().await;
                if let Some(issue) = result.issue() {
                    tracing::warn!(issue, "Weather enrichment degraded");
                }
                Some(result)
            }
            None => None,
        };

        stages.enter(Stage::Evaluate);
        let violations = evaluate(&readings, &self.config.thresholds);

        stages.enter(Stage::Notify);
        let alert = self.notify(&violations).await;

        stages.enter(Stage::Persist);
        let record = PersistRecord::new(&readings, weather.as_ref());
        self.store.persist(&record).await?;

        tracing::info!(
            readings = readings.len(),
            missing = missing.len(),
            violations = violations.len(),
            "Poll cycle complete",
        );

        Ok(CycleReport {
            readings,
            violations,
            weather,
            alert,
            missing,
            stages: stages.0,
        })
    }

    async fn notify(&self, violations: &[Violation]) -> AlertOutcome {
        if violations.is_empty() {
            return AlertOutcome::NotNeeded;
        }

        let Some(alerts) = self.alerts else {
            tracing::warn!(
                violations = violations.len(),
                "Thresholds crossed but mail is not configured",
            );
            return AlertOutcome::NotConfigured;
        };

        match alerts.notify(violations).await {
            Ok(()) => {
                tracing::info!(violations = violations.len(), "Threshold alert sent");
                AlertOutcome::Sent
            }
            Err(e) => {
                tracing::warn!(error = %e, "Threshold alert failed; continuing");
                AlertOutcome::Failed
            }
        }
    }
}

#[derive(Default)]
struct StageTrace(Vec<Stage>);

impl StageTrace {
    fn enter(&mut self, stage: Stage) {
        tracing::debug!(%stage, "Cycle stage");
        self.0.push(stage);
    }
}
