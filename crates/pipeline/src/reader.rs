//! Sensor reads with one delayed retry.
//!
//! The first pass reads every configured sensor, at most
//! [`MAX_CONCURRENT_READS`] at a time, each bounded by the read timeout.
//! Reads complete in any order, so a hung sensor only holds its own slot.
//! Sensors that failed are read once more after the retry wait, and only
//! after the whole first pass has finished. Whatever still fails is absent
//! from the result.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use owtenter_core::config::OwServerConfig;
use owtenter_core::reading::RawReading;
use owtenter_core::sensor::SensorSpec;
use owtenter_core::types::SensorId;

use crate::ports::SensorNetwork;

/// In-flight reads per pass.
pub const MAX_CONCURRENT_READS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retry,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Retry => f.write_str("retry"),
        }
    }
}

/// Result of reading every configured sensor.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    /// Successful reads, in configured order.
    pub raw: Vec<RawReading>,
    /// Sensors that failed both attempts, in configured order.
    pub failed: Vec<SensorId>,
    /// Sensors that needed the retry pass, whatever its result.
    pub retried: usize,
}

/// Values gathered so far and the sensors still without one.
#[derive(Debug)]
pub struct PassResult<'s> {
    sensors: &'s [SensorSpec],
    values: HashMap<&'s str, Vec<u8>>,
    pending: Vec<&'s SensorSpec>,
    retried: usize,
}

impl<'s> PassResult<'s> {
    pub fn needs_retry(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Order the values as configured. Sensors without a value are failed.
    pub fn into_outcome(mut self) -> ReadOutcome {
        let mut outcome = ReadOutcome {
            retried: self.retried,
            ..ReadOutcome::default()
        };
        for spec in self.sensors {
            match self.values.remove(spec.id.as_str()) {
                Some(raw) => outcome.raw.push(RawReading {
                    sensor_id: spec.id.clone(),
                    kind: spec.kind,
                    raw,
                }),
                None => outcome.failed.push(spec.id.clone()),
            }
        }

        if !outcome.failed.is_empty() {
            tracing::warn!(sensors = ?outcome.failed, "Sensors absent from this cycle");
        }
        tracing::debug!(
            read = outcome.raw.len(),
            failed = outcome.failed.len(),
            retried = outcome.retried,
            "Sensor reads complete",
        );

        outcome
    }

    fn record(&mut self, spec: &'s SensorSpec, value: Option<Vec<u8>>) {
        match value {
            Some(raw) => {
                self.values.insert(spec.id.as_str(), raw);
            }
            None => self.pending.push(spec),
        }
    }
}

pub struct SensorReader<'a> {
    network: &'a dyn SensorNetwork,
    read_timeout: Duration,
    retry_wait: Duration,
}

impl<'a> SensorReader<'a> {
    pub fn new(network: &'a dyn SensorNetwork, config: &OwServerConfig) -> Self {
        Self {
            network,
            read_timeout: config.read_timeout,
            retry_wait: config.retry_wait,
        }
    }

    /// First pass, then the retry pass if anything failed.
    pub async fn read_all(&self, sensors: &[SensorSpec]) -> ReadOutcome {
        let mut pass = self.first_pass(sensors).await;
        if pass.needs_retry() {
            pass = self.retry_failed(pass).await;
        }
        pass.into_outcome()
    }

    pub async fn first_pass<'s>(&self, sensors: &'s [SensorSpec]) -> PassResult<'s> {
        let mut pass = PassResult {
            sensors,
            values: HashMap::with_capacity(sensors.len()),
            pending: Vec::new(),
            retried: 0,
        };
        for (spec, value) in self.read_pass(sensors.iter().collect(), Attempt::First).await {
            pass.record(spec, value);
        }
        pass
    }

    /// Wait, then read every sensor that failed the first pass once more.
    pub async fn retry_failed<'s>(&self, mut pass: PassResult<'s>) -> PassResult<'s> {
        let pending = std::mem::take(&mut pass.pending);
        if pending.is_empty() {
            return pass;
        }

        pass.retried = pending.len();
        tracing::info!(
            failed = pending.len(),
            wait_secs = self.retry_wait.as_secs(),
            "Retrying failed sensors",
        );
        tokio::time::sleep(self.retry_wait).await;

        for (spec, value) in self.read_pass(pending, Attempt::Retry).await {
            pass.record(spec, value);
        }
        pass
    }

    /// Results arrive in completion order.
    async fn read_pass<'s>(
        &self,
        sensors: Vec<&'s SensorSpec>,
        attempt: Attempt,
    ) -> Vec<(&'s SensorSpec, Option<Vec<u8>>)> {
        stream::iter(sensors)
            .map(|spec| async move { (spec, self.read_one(spec, attempt).await) })
            .buffer_unordered(MAX_CONCURRENT_READS)
            .collect()
            .await
    }

    async fn read_one(&self, spec: &SensorSpec, attempt: Attempt) -> Option<Vec<u8>> {
        match tokio::time::timeout(self.read_timeout, self.network.read(&spec.path)).await {
            Ok(Ok(raw)) => {
                tracing::debug!(sensor_id = %spec.id, path = %spec.path, %attempt, "Sensor read");
                Some(raw)
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    sensor_id = %spec.id,
                    path = %spec.path,
                    %attempt,
                    error = %e,
                    "Sensor read failed",
                );
                None
            }
            Err(_) => {
                tracing::warn!(
                    sensor_id = %spec.id,
                    path = %spec.path,
                    %attempt,
                    timeout_secs = self.read_timeout.as_secs(),
                    "Sensor read timed out",
                );
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
