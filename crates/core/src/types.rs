/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifier of a configured sensor, e.g. `livingroom_temperature`.
pub type SensorId = String;
