//! Immutable pipeline configuration.
//!
//! Built once at process start, from environment variables, and passed by
//! reference into every stage of the cycle.
//!
//! | Variable                   | Required | Default                     |
//! |----------------------------|----------|-----------------------------|
//! | `OWSERVER_HOST`            | no       | `localhost`                 |
//! | `OWSERVER_PORT`            | no       | `4304`                      |
//! | `OWSENSORS`                | yes      | --                          |
//! | `OWRETRY_SECS`             | no       | `5`                         |
//! | `OWREAD_TIMEOUT_SECS`      | no       | `10`                        |
//! | `THRESHOLDS`               | no       | --                          |
//! | `WEATHER_URL`              | no       | --                          |
//! | `DB_HOST`                  | no       | `localhost`                 |
//! | `DB_PORT`                  | no       | `5432`                      |
//! | `DB_NAME`                  | yes      | --                          |
//! | `DB_USER`                  | yes      | --                          |
//! | `DB_PASSWORD`              | yes      | --                          |
//! | `DB_TABLE`                 | yes      | --                          |
//! | `MAIL_HOST`                | no       | -- (alerting disabled)      |
//! | `MAIL_PORT`                | no       | `587`                       |
//! | `MAIL_FROM`                | with host| --                          |
//! | `MAIL_PASSWORD`            | with host| --                          |
//! | `MAIL_TO`                  | with host| --                          |
//! | `MAIL_SUBJECT`             | no       | `Sensor threshold crossed`  |
//! | `TEMPERATURE_SCALE_SYMBOL` | no       | `C`                         |
//!
//! `OWSENSORS` is an ordered list of `id=path` pairs, e.g.
//! `attic_temperature=/28.6F1F1D040000/temperature,bath_humidity=/26.B5D5E1000000/humidity`.
//! `THRESHOLDS` lists `<id>_upper=<n>` and `<id>_lower=<n>` pairs.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use crate::alert::DEFAULT_TEMPERATURE_UNIT;
use crate::error::CoreError;
use crate::sensor::SensorSpec;
use crate::thresholds::Thresholds;

/// Default owserver TCP port.
pub const DEFAULT_OWSERVER_PORT: u16 = 4304;

/// Default wait before re-reading failed sensors.
const DEFAULT_RETRY_SECS: u64 = 5;

/// Default bound on a single sensor read.
const DEFAULT_READ_TIMEOUT_SECS: u64 = 10;

const DEFAULT_DB_PORT: u16 = 5432;

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

const DEFAULT_MAIL_SUBJECT: &str = "Sensor threshold crossed";

/// Where the bus proxy lives and how patiently to read from it.
#[derive(Debug, Clone)]
pub struct OwServerConfig {
    pub host: String,
    pub port: u16,
    /// Bound on each individual sensor read.
    pub read_timeout: Duration,
    /// Wait between the first pass and the retry pass.
    pub retry_wait: Duration,
}

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// Fully formed endpoint, query string and API key included.
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Table receiving one row per cycle.
    pub table: String,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    /// Sender address, also the SMTP login.
    pub from_address: String,
    pub password: String,
    /// Recipient mailbox, `Name <user@domain>` or a bare address.
    pub recipient: String,
    pub subject: String,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub owserver: OwServerConfig,
    /// Sensors in configured order.
    pub sensors: Vec<SensorSpec>,
    pub thresholds: Thresholds,
    /// Present iff weather enrichment is enabled.
    pub weather: Option<WeatherConfig>,
    pub database: DatabaseConfig,
    /// Present iff alert emails are enabled.
    pub mail: Option<MailConfig>,
    pub temperature_unit: String,
}

impl PipelineConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let owserver = OwServerConfig {
            host: vars.or("OWSERVER_HOST", "localhost"),
            port: vars.parse_or("OWSERVER_PORT", DEFAULT_OWSERVER_PORT)?,
            read_timeout: Duration::from_secs(
                vars.parse_or("OWREAD_TIMEOUT_SECS", DEFAULT_READ_TIMEOUT_SECS)?,
            ),
            retry_wait: Duration::from_secs(vars.parse_or("OWRETRY_SECS", DEFAULT_RETRY_SECS)?),
        };

        let sensors = parse_sensors(&vars.required("OWSENSORS")?)?;
        let thresholds = parse_thresholds(&vars.get("THRESHOLDS").unwrap_or_default())?;

        let weather = vars.get("WEATHER_URL").map(|url| WeatherConfig { url });

        let database = DatabaseConfig {
            host: vars.or("DB_HOST", "localhost"),
            port: vars.parse_or("DB_PORT", DEFAULT_DB_PORT)?,
            database: vars.required("DB_NAME")?,
            user: vars.required("DB_USER")?,
            password: vars.required("DB_PASSWORD")?,
            table: vars.required("DB_TABLE")?,
        };

        let mail = match vars.get("MAIL_HOST") {
            Some(host) => Some(MailConfig {
                host,
                port: vars.parse_or("MAIL_PORT", DEFAULT_SMTP_PORT)?,
                from_address: vars.required("MAIL_FROM")?,
                password: vars.required("MAIL_PASSWORD")?,
                recipient: vars.required("MAIL_TO")?,
                subject: vars.or("MAIL_SUBJECT", DEFAULT_MAIL_SUBJECT),
            }),
            None => None,
        };

        Ok(Self {
            owserver,
            sensors,
            thresholds,
            weather,
            database,
            mail,
            temperature_unit: vars.or("TEMPERATURE_SCALE_SYMBOL", DEFAULT_TEMPERATURE_UNIT),
        })
    }
}

/// Lookup wrapper treating blank values as unset.
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &str) -> Result<String, CoreError> {
        self.get(key)
            .ok_or_else(|| CoreError::Config(format!("{key} must be set")))
    }

    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, CoreError> {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| CoreError::Config(format!("{key} has an invalid value: {raw}"))),
            None => Ok(default),
        }
    }
}

/// Split `a=1, b=2` into trimmed pairs, skipping empty entries.
fn parse_pairs<'a>(list: &'a str, key: &str) -> Result<Vec<(&'a str, &'a str)>, CoreError> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .ok_or_else(|| CoreError::Config(format!("{key} entry `{entry}` is not key=value")))
        })
        .collect()
}

fn parse_sensors(list: &str) -> Result<Vec<SensorSpec>, CoreError> {
    let mut seen = HashSet::new();
    let mut sensors = Vec::new();

    for (id, path) in parse_pairs(list, "OWSENSORS")? {
        if id.is_empty() || path.is_empty() {
            return Err(CoreError::Config(
                "OWSENSORS entries need both an id and a path".to_string(),
            ));
        }
        if !seen.insert(id) {
            return Err(CoreError::Config(format!("Duplicate sensor id `{id}` in OWSENSORS")));
        }
        sensors.push(SensorSpec::new(id, path));
    }

    if sensors.is_empty() {
        return Err(CoreError::Config("OWSENSORS lists no sensors".to_string()));
    }
    Ok(sensors)
}

fn parse_thresholds(list: &str) -> Result<Thresholds, CoreError> {
    let mut thresholds = Thresholds::new();
    for (key, value) in parse_pairs(list, "THRESHOLDS")? {
        if !thresholds.insert_keyed(key, value) {
            return Err(CoreError::Config(format!(
                "THRESHOLDS key `{key}` must end in _upper or _lower"
            )));
        }
    }
    Ok(thresholds)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
