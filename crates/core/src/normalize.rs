//! Raw bus value → normalized [`Reading`].
//!
//! Temperatures keep one decimal, humidities are whole percent, anything
//! else passes through as parsed. Values that do not parse as a finite
//! number are dropped so a corrupt or partial read never reaches a row.

use crate::reading::{RawReading, Reading};
use crate::sensor::SensorKind;

/// Round a parsed value the way its kind is stored.
///
/// Rounding applies to the exact binary value, with exact ties going to
/// even, so `0.35` (stored just below 0.35) becomes `0.3`. Applying this
/// twice gives the same result as once.
pub fn normalize_value(kind: SensorKind, value: f64) -> f64 {
    match kind {
        SensorKind::Temperature => round_one_decimal(value),
        SensorKind::Humidity => value.round_ties_even(),
        SensorKind::Other => value,
    }
}

/// Decimal formatting is correctly rounded, unlike scaling by ten first.
fn round_one_decimal(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

/// Parse raw bus bytes as a finite number.
///
/// owserver pads values with leading spaces, so the text is trimmed first.
pub fn parse_raw(raw: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(raw).ok()?.trim();
    let value: f64 = text.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Normalize one raw reading, or `None` if it is not numeric.
pub fn normalize(raw: &RawReading) -> Option<Reading> {
    let Some(value) = parse_raw(&raw.raw) else {
        tracing::warn!(
            sensor_id = %raw.sensor_id,
            raw = %String::from_utf8_lossy(&raw.raw).trim(),
            "Dropping non-numeric sensor value",
        );
        return None;
    };

    Some(Reading {
        sensor_id: raw.sensor_id.clone(),
        value: normalize_value(raw.kind, value),
        kind: raw.kind,
    })
}

/// Normalize every raw reading, keeping order and dropping the non-numeric ones.
pub fn normalize_all<'a>(raws: impl IntoIterator<Item = &'a RawReading>) -> Vec<Reading> {
    raws.into_iter().filter_map(normalize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, value: &str) -> RawReading {
        RawReading {
            sensor_id: id.to_string(),
            kind: SensorKind::from_id(id),
            raw: value.as_bytes().to_vec(),
        }
    }

    #[test]
    fn temperature_rounds_to_one_decimal() {
        let reading = normalize(&raw("attic_temperature", "     21.37")).unwrap();
        assert_eq!(reading.value, 21.4);
        assert_eq!(reading.kind, SensorKind::Temperature);

        for (raw_value, expected) in [
            (0.35, 0.3),
            (0.15, 0.1),
            (21.45, 21.4),
            (2.25, 2.2),
            (2.35, 2.4),
            (-0.05, -0.1),
        ] {
            assert_eq!(
                normalize_value(SensorKind::Temperature, raw_value),
                expected,
                "{raw_value}"
            );
        }
    }

    #[test]
    fn humidity_rounds_to_whole_percent() {
        assert_eq!(normalize(&raw("bath_humidity", "55.2")).unwrap().value, 55.0);
        assert_eq!(normalize(&raw("bath_humidity", "55.5")).unwrap().value, 56.0);
        assert_eq!(normalize(&raw("bath_humidity", "54.5")).unwrap().value, 54.0);
    }

    #[test]
    fn other_passes_through_unchanged() {
        assert_eq!(normalize(&raw("door_counter", " 1234.567 ")).unwrap().value, 1234.567);
    }

    #[test]
    fn non_numeric_values_are_dropped() {
        assert!(normalize(&raw("attic_temperature", "")).is_none());
        assert!(normalize(&raw("attic_temperature", "85.0x")).is_none());
        assert!(normalize(&raw("bath_humidity", "nan")).is_none());
        assert!(normalize(&raw("bath_humidity", "inf")).is_none());
        let invalid_utf8 = RawReading {
            sensor_id: "door_counter".to_string(),
            kind: SensorKind::Other,
            raw: vec![0xff, 0xfe],
        };
        assert!(normalize(&invalid_utf8).is_none());
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [-12.35, -0.05, 0.0, 0.15, 21.37, 21.45, 54.5, 55.5, 99.99, 1e6 + 0.25];
        for kind in [SensorKind::Temperature, SensorKind::Humidity, SensorKind::Other] {
            for value in samples {
                let once = normalize_value(kind, value);
                assert_eq!(normalize_value(kind, once), once, "{kind:?} {value}");
            }
        }
    }

    #[test]
    fn normalize_all_keeps_order_and_drops_garbage() {
        let raws = vec![
            raw("b_humidity", "40.4"),
            raw("c_temperature", "garbage"),
            raw("a_temperature", "19.96"),
        ];
        let readings = normalize_all(&raws);
        let ids: Vec<_> = readings.iter().map(|r| r.sensor_id.as_str()).collect();
        assert_eq!(ids, vec!["b_humidity", "a_temperature"]);
        assert_eq!(readings[1].value, 20.0);
    }
}
