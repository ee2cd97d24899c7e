//! Configured sensors and their declared kind.
//!
//! The kind of a sensor is derived once, from the naming convention of its
//! id, when the configuration is loaded. Nothing downstream inspects the id
//! suffix again.

use serde::Serialize;

use crate::types::SensorId;

/// Id suffix marking a temperature sensor.
pub const TEMPERATURE_SUFFIX: &str = "_temperature";

/// Id suffix marking a relative humidity sensor.
pub const HUMIDITY_SUFFIX: &str = "_humidity";

/// What a sensor measures, which decides how its raw value is normalized
/// and how it is worded in alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Other,
}

impl SensorKind {
    /// Classify a sensor id by its suffix.
    pub fn from_id(id: &str) -> Self {
        if id.ends_with(TEMPERATURE_SUFFIX) {
            Self::Temperature
        } else if id.ends_with(HUMIDITY_SUFFIX) {
            Self::Humidity
        } else {
            Self::Other
        }
    }
}

/// A sensor on the bus: its id (also its column name), its bus path and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorSpec {
    pub id: SensorId,
    pub path: String,
    pub kind: SensorKind,
}

impl SensorSpec {
    pub fn new(id: impl Into<SensorId>, path: impl Into<String>) -> Self {
        let id = id.into();
        let kind = SensorKind::from_id(&id);
        Self {
            id,
            path: path.into(),
            kind,
        }
    }

    /// The id with its kind suffix removed, for human-facing text.
    ///
    /// `Other` sensors have no suffix and keep their full id.
    pub fn friendly_name(&self) -> &str {
        friendly_name(&self.id, self.kind)
    }
}

/// Strip the suffix that gave `id` its `kind`.
pub fn friendly_name(id: &str, kind: SensorKind) -> &str {
    let suffix = match kind {
        SensorKind::Temperature => TEMPERATURE_SUFFIX,
        SensorKind::Humidity => HUMIDITY_SUFFIX,
        SensorKind::Other => return id,
    };
    id.strip_suffix(suffix).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_derived_from_suffix() {
        assert_eq!(SensorKind::from_id("attic_temperature"), SensorKind::Temperature);
        assert_eq!(SensorKind::from_id("bath_humidity"), SensorKind::Humidity);
        assert_eq!(SensorKind::from_id("door_counter"), SensorKind::Other);
        // The suffix must be at the very end.
        assert_eq!(SensorKind::from_id("temperature_logger"), SensorKind::Other);
    }

    #[test]
    fn friendly_name_strips_kind_suffix() {
        assert_eq!(SensorSpec::new("attic_temperature", "/28.1/temperature").friendly_name(), "attic");
        assert_eq!(
            SensorSpec::new("master_bath_humidity", "/26.1/humidity").friendly_name(),
            "master_bath"
        );
        assert_eq!(SensorSpec::new("door_counter", "/1D.1/counter.A").friendly_name(), "door_counter");
    }

    #[test]
    fn bare_suffix_yields_empty_friendly_name() {
        let spec = SensorSpec::new("_humidity", "/26.1/humidity");
        assert_eq!(spec.kind, SensorKind::Humidity);
        assert_eq!(spec.friendly_name(), "");
    }
}
