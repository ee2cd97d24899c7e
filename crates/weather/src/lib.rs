//! Weather enrichment from an OpenWeatherMap "current weather" endpoint.
//!
//! [`WeatherEnricher`] issues a GET to a fully formed URL, retries once after
//! a fixed backoff when the first attempt fails, and reshapes the response
//! into a [`WeatherReport`]. It never fails: every problem is folded into a
//! [`WeatherResult`] placeholder that is stored with the cycle's record.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Number;

use owtenter_core::weather::{WeatherReport, WeatherResult};

/// Wait between the failed first attempt and the retry.
pub const RETRY_DELAY: Duration = Duration::from_secs(9);

/// HTTP request timeout for a single attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Total number of attempts, the first included.
const ATTEMPTS: u32 = 2;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Why a single fetch attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status code.
    #[error("Weather service returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// WeatherEnricher
// ---------------------------------------------------------------------------

pub struct WeatherEnricher {
    client: reqwest::Client,
    url: String,
    retry_delay: Duration,
}

impl WeatherEnricher {
    /// Create an enricher for `url` with a pre-configured HTTP client.
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
            retry_delay: RETRY_DELAY,
        })
    }

    /// Override the backoff between attempts.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Fetch current conditions. Always returns a storable result.
    pub async fn fetch(&self) -> WeatherResult {
        for attempt in 1..=ATTEMPTS {
            match self.try_fetch().await {
                Ok(body) => return extract(&body),
                Err(e) if attempt < ATTEMPTS => {
                    tracing::warn!(
                        attempt,
                        error = %e,
                        retry_in_secs = self.retry_delay.as_secs_f64(),
                        "Weather request failed, retrying",
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Weather request failed, giving up");
                }
            }
        }
        WeatherResult::Unavailable
    }

    /// Execute a single GET and return the body of a successful response.
    async fn try_fetch(&self) -> Result<String, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }
}

// ---------------------------------------------------------------------------
// Response schema
// ---------------------------------------------------------------------------

/// The fields of <https://openweathermap.org/current> that are kept.
#[derive(Deserialize)]
struct Response {
    weather: Vec<ResponseCondition>,
    main: ResponseMain,
    visibility: Number,
    clouds: ResponseClouds,
    wind: ResponseWind,
}

#[derive(Deserialize)]
struct ResponseCondition {
    description: String,
}

#[derive(Deserialize)]
struct ResponseMain {
    temp: Number,
    humidity: Number,
    pressure: Number,
}

#[derive(Deserialize)]
struct ResponseClouds {
    /// Cloudiness, %.
    all: Number,
}

#[derive(Deserialize)]
struct ResponseWind {
    speed: Number,
}

/// Reshape a response body, or report a schema change if any field is gone.
pub fn extract(body: &str) -> WeatherResult {
    let parsed = serde_json::from_str::<Response>(body).map_err(|e| e.to_string());
    let report = parsed.and_then(|response| {
        let condition = response
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| "empty `weather` list".to_string())?;
        Ok(WeatherReport {
            description: condition.description,
            temp: response.main.temp,
            humidity: response.main.humidity,
            pressure: response.main.pressure,
            visibility: response.visibility,
            clouds: response.clouds.all,
            windspeed: response.wind.speed,
        })
    });

    match report {
        Ok(report) => WeatherResult::Report(report),
        Err(reason) => {
            tracing::warn!(reason = %reason, "Weather response schema has changed");
            WeatherResult::SchemaChanged
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
