//! Alert text for threshold violations.

use crate::sensor::{friendly_name, SensorKind};
use crate::thresholds::Violation;

/// Temperature unit used when none is configured.
pub const DEFAULT_TEMPERATURE_UNIT: &str = "C";

/// One human-readable line for a violation.
pub fn violation_line(violation: &Violation, temperature_unit: &str) -> String {
    let reading = &violation.reading;
    let name = friendly_name(&reading.sensor_id, reading.kind);
    match reading.kind {
        SensorKind::Temperature => format!(
            "The sensor '{name}' reports a temperature of {:.1} {temperature_unit}",
            reading.value
        ),
        SensorKind::Humidity => format!(
            "The sensor '{name}' reports a relative humidity of {:.0}%",
            reading.value
        ),
        SensorKind::Other => format!("The sensor '{name}' reports a value of {}", reading.value),
    }
}

/// The plain-text email body covering every violation of the cycle.
pub fn compose_body(violations: &[Violation], temperature_unit: &str) -> String {
    let mut body = String::new();
    for violation in violations {
        body.push_str(&violation_line(violation, temperature_unit));
        body.push('\n');
    }
    body
}
