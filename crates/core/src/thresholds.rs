//! Threshold evaluation for a cycle's readings.
//!
//! Pure logic, no I/O. Bounds are kept exactly as configured so a malformed
//! bound only disables its own check, and is reported when it is reached.

use std::collections::HashMap;

use serde::Serialize;

use crate::reading::{Reading, ReadingSet};
use crate::types::SensorId;

/// Configuration key suffix for an upper bound.
pub const UPPER_SUFFIX: &str = "_upper";

/// Configuration key suffix for a lower bound.
pub const LOWER_SUFFIX: &str = "_lower";

/// Which side of the allowed range a reading left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundKind {
    Upper,
    Lower,
}

/// A configured bound, parsed if possible.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Valid(f64),
    /// The configured text did not parse as a finite number.
    Malformed(String),
}

impl Bound {
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Valid(value),
            _ => Self::Malformed(text.to_string()),
        }
    }
}

/// Upper and lower bounds of one sensor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdSpec {
    pub upper: Option<Bound>,
    pub lower: Option<Bound>,
}

/// All configured thresholds keyed by sensor id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thresholds {
    by_sensor: HashMap<SensorId, ThresholdSpec>,
}

impl Thresholds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bound from a `<sensor_id>_upper` / `<sensor_id>_lower` key.
    ///
    /// Returns `false` if the key carries neither suffix.
    pub fn insert_keyed(&mut self, key: &str, value: &str) -> bool {
        let (sensor_id, kind) = if let Some(id) = key.strip_suffix(UPPER_SUFFIX) {
            (id, BoundKind::Upper)
        } else if let Some(id) = key.strip_suffix(LOWER_SUFFIX) {
            (id, BoundKind::Lower)
        } else {
            return false;
        };
        self.insert(sensor_id, kind, Bound::parse(value));
        true
    }

    pub fn insert(&mut self, sensor_id: &str, kind: BoundKind, bound: Bound) {
        let spec = self.by_sensor.entry(sensor_id.to_string()).or_default();
        match kind {
            BoundKind::Upper => spec.upper = Some(bound),
            BoundKind::Lower => spec.lower = Some(bound),
        }
    }

    pub fn get(&self, sensor_id: &str) -> Option<&ThresholdSpec> {
        self.by_sensor.get(sensor_id)
    }

    pub fn is_empty(&self) -> bool {
        self.by_sensor.is_empty()
    }
}

/// A reading outside its configured range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub reading: Reading,
    pub bound_kind: BoundKind,
    pub bound: f64,
}

impl Violation {
    pub fn sensor_id(&self) -> &str {
        &self.reading.sensor_id
    }
}

/// Compare every reading against its bounds.
///
/// A violation needs `value > upper` or `value < lower`; equality is within
/// range. A sensor yields at most one violation per cycle, the upper bound
/// being checked first. Malformed bounds or non-finite readings skip their
/// check with a warning and never stop evaluation of other sensors.
pub fn evaluate(readings: &ReadingSet, thresholds: &Thresholds) -> Vec<Violation> {
    let mut violations = Vec::new();

    for reading in readings.iter() {
        let Some(spec) = thresholds.get(&reading.sensor_id) else {
            continue;
        };

        let checks = [
            (BoundKind::Upper, spec.upper.as_ref()),
            (BoundKind::Lower, spec.lower.as_ref()),
        ];
        for (kind, bound) in checks {
            let Some(bound) = bound else { continue };
            if let Some(violation) = check_bound(reading, kind, bound) {
                violations.push(violation);
                break;
            }
        }
    }

    violations
}

fn check_bound(reading: &Reading, kind: BoundKind, bound: &Bound) -> Option<Violation> {
    let limit = match bound {
        Bound::Valid(limit) => *limit,
        Bound::Malformed(text) => {
            tracing::warn!(
                sensor_id = %reading.sensor_id,
                bound = ?kind,
                value = %text,
                "Skipping threshold check, bound is not a number",
            );
            return None;
        }
    };

    if !reading.value.is_finite() {
        tracing::warn!(
            sensor_id = %reading.sensor_id,
            "Skipping threshold check, reading is not a finite number",
        );
        return None;
    }

    let crossed = match kind {
        BoundKind::Upper => reading.value > limit,
        BoundKind::Lower => reading.value < limit,
    };

    crossed.then(|| Violation {
        reading: reading.clone(),
        bound_kind: kind,
        bound: limit,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
