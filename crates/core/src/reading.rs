//! Readings produced by one poll cycle.

use serde::Serialize;

use crate::sensor::SensorKind;
use crate::types::{SensorId, Timestamp};

/// The bytes returned by one successful bus read, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReading {
    pub sensor_id: SensorId,
    pub kind: SensorKind,
    pub raw: Vec<u8>,
}

/// A successfully parsed and normalized sensor value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub sensor_id: SensorId,
    pub value: f64,
    pub kind: SensorKind,
}

/// All readings of one cycle, in configured sensor order, stamped once after
/// every read (including retries) has settled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingSet {
    readings: Vec<Reading>,
    captured_at: Timestamp,
}

impl ReadingSet {
    /// Build a set from readings in configured order.
    ///
    /// A later reading for an id already present replaces the earlier one in
    /// place, so ids stay unique and keep their first position.
    pub fn new(readings: impl IntoIterator<Item = Reading>, captured_at: Timestamp) -> Self {
        let mut ordered: Vec<Reading> = Vec::new();
        for reading in readings {
            match ordered.iter_mut().find(|r| r.sensor_id == reading.sensor_id) {
                Some(existing) => *existing = reading,
                None => ordered.push(reading),
            }
        }
        Self {
            readings: ordered,
            captured_at,
        }
    }

    pub fn captured_at(&self) -> Timestamp {
        self.captured_at
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn get(&self, sensor_id: &str) -> Option<&Reading> {
        self.readings.iter().find(|r| r.sensor_id == sensor_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    /// Sensor ids in configured order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.readings.iter().map(|r| r.sensor_id.as_str())
    }
}
