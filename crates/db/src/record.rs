//! The row persisted for a cycle.
//!
//! Columns are derived from the data: one per surviving reading, named by
//! its sensor id, then `timestamp`, then `weather` when enrichment ran.

use owtenter_core::reading::ReadingSet;
use owtenter_core::sensor::SensorKind;
use owtenter_core::weather::WeatherResult;

use crate::error::PersistError;
use crate::insert::{ColumnValue, InsertBuilder, InsertStatement};

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const WEATHER_COLUMN: &str = "weather";

#[derive(Debug, Clone)]
pub struct PersistRecord {
    columns: Vec<(String, ColumnValue)>,
}

impl PersistRecord {
    /// Build the row for `readings`, stamped with their capture time.
    ///
    /// Humidity readings are stored as whole numbers, the other kinds as floats.
    pub fn new(readings: &ReadingSet, weather: Option<&WeatherResult>) -> Self {
        let mut columns: Vec<(String, ColumnValue)> = readings
            .iter()
            .map(|reading| {
                let value = match reading.kind {
                    SensorKind::Humidity => ColumnValue::Integer(reading.value as i64),
                    SensorKind::Temperature | SensorKind::Other => ColumnValue::Float(reading.value),
                };
                (reading.sensor_id.clone(), value)
            })
            .collect();

        columns.push((
            TIMESTAMP_COLUMN.to_string(),
            ColumnValue::Timestamp(readings.captured_at()),
        ));

        if let Some(weather) = weather {
            columns.push((WEATHER_COLUMN.to_string(), ColumnValue::Json(weather.to_json())));
        }

        Self { columns }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Render the INSERT into `table`.
    pub fn to_insert(&self, table: &str) -> Result<InsertStatement, PersistError> {
        self.columns
            .iter()
            .cloned()
            .fold(InsertBuilder::new(table), |builder, (name, value)| {
                builder.column(name, value)
            })
            .build()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use owtenter_core::reading::Reading;

    use super::*;

    fn readings() -> ReadingSet {
        ReadingSet::new(
            vec![
                Reading {
                    sensor_id: "temp1_temperature".to_string(),
                    value: 21.4,
                    kind: SensorKind::Temperature,
                },
                Reading {
                    sensor_id: "hum1_humidity".to_string(),
                    value: 55.0,
                    kind: SensorKind::Humidity,
                },
            ],
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn columns_are_readings_plus_timestamp() {
        let set = readings();
        let record = PersistRecord::new(&set, None);

        let expected: BTreeSet<&str> = set.keys().chain([TIMESTAMP_COLUMN]).collect();
        assert_eq!(record.column_names().collect::<BTreeSet<_>>(), expected);
        assert_eq!(record.get("temp1_temperature"), Some(&ColumnValue::Float(21.4)));
        assert_eq!(record.get("hum1_humidity"), Some(&ColumnValue::Integer(55)));
        assert_eq!(
            record.get(TIMESTAMP_COLUMN),
            Some(&ColumnValue::Timestamp(set.captured_at()))
        );
    }

    #[test]
    fn weather_column_only_when_enriched() {
        let record = PersistRecord::new(&readings(), Some(&WeatherResult::Unavailable));
        assert_eq!(record.column_names().last(), Some(WEATHER_COLUMN));
        assert_eq!(
            record.get(WEATHER_COLUMN),
            Some(&ColumnValue::Json(json!({ "issue": "openweathermap service availability issue" })))
        );
    }

    #[test]
    fn insert_lists_columns_in_record_order() {
        let statement = PersistRecord::new(&readings(), Some(&WeatherResult::SchemaChanged))
            .to_insert("climate")
            .unwrap();
        assert_eq!(
            statement.sql(),
            r#"INSERT INTO "climate" ("temp1_temperature", "hum1_humidity", "timestamp", "weather") VALUES ($1, $2, $3, $4)"#
        );
    }

    #[test]
    fn sensor_named_timestamp_collides() {
        let set = ReadingSet::new(
            vec![Reading {
                sensor_id: "timestamp".to_string(),
                value: 1.0,
                kind: SensorKind::Other,
            }],
            Utc::now(),
        );
        let result = PersistRecord::new(&set, None).to_insert("climate");
        assert!(matches!(result, Err(PersistError::DuplicateColumn(_))));
    }
}
