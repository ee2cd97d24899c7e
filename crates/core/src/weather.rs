//! Outdoor weather attached to a cycle's record.

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Issue reported when the weather service answered with errors twice.
pub const ISSUE_AVAILABILITY: &str = "openweathermap service availability issue";

/// Issue reported when the weather response no longer has the expected fields.
pub const ISSUE_SCHEMA_CHANGE: &str = "openweathermap schema change";

/// The subset of current conditions stored with each record.
///
/// Numbers are kept as the service sent them: `60` stays an integer and
/// `19.47` a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub description: String,
    pub temp: Number,
    pub humidity: Number,
    pub pressure: Number,
    pub visibility: Number,
    pub clouds: Number,
    pub windspeed: Number,
}

/// Outcome of weather enrichment. Never an error: failures become a
/// placeholder that is stored in place of the report.
///
/// Serializes as the bare report, or as `{"issue": "..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherResult {
    Report(WeatherReport),
    Unavailable,
    SchemaChanged,
}

#[derive(Serialize)]
struct IssuePayload<'a> {
    issue: &'a str,
}

impl WeatherResult {
    pub fn issue(&self) -> Option<&'static str> {
        match self {
            Self::Report(_) => None,
            Self::Unavailable => Some(ISSUE_AVAILABILITY),
            Self::SchemaChanged => Some(ISSUE_SCHEMA_CHANGE),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Both shapes are plain structs of strings and numbers.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for WeatherResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Report(report) => report.serialize(serializer),
            Self::Unavailable | Self::SchemaChanged => IssuePayload {
                issue: self.issue().unwrap_or_default(),
            }
            .serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn float(value: f64) -> Number {
        Number::from_f64(value).unwrap()
    }

    #[test]
    fn report_serializes_flat_with_numbers_as_received() {
        let result = WeatherResult::Report(WeatherReport {
            description: "few clouds".to_string(),
            temp: float(19.47),
            humidity: Number::from(60),
            pressure: Number::from(1010),
            visibility: Number::from(10000),
            clouds: Number::from(20),
            windspeed: float(8.2),
        });
        let value = result.to_json();
        assert_eq!(
            value,
            json!({
                "description": "few clouds",
                "temp": 19.47,
                "humidity": 60,
                "pressure": 1010,
                "visibility": 10000,
                "clouds": 20,
                "windspeed": 8.2,
            })
        );
        assert!(value["humidity"].is_u64());
        assert!(value["temp"].is_f64());
    }

    #[test]
    fn placeholders_serialize_as_issue() {
        assert_eq!(
            WeatherResult::Unavailable.to_json(),
            json!({ "issue": "openweathermap service availability issue" })
        );
        assert_eq!(
            WeatherResult::SchemaChanged.to_json(),
            json!({ "issue": "openweathermap schema change" })
        );
    }
}
