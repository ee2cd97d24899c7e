//! `owtenter` -- one poll cycle of the 1-Wire sensor logger.
//!
//! Reads every configured sensor through owserver, optionally attaches the
//! current weather, mails an alert when a threshold is crossed and inserts
//! one row into PostgreSQL. Meant to be run periodically by cron or a
//! systemd timer; the exit status is non-zero when the cycle was aborted.
//!
//! Configuration comes from the environment (a `.env` file is honoured);
//! see [`owtenter_core::config`] for the variables.

use std::process::ExitCode;

use owtenter_alerts::EmailNotifier;
use owtenter_core::config::PipelineConfig;
use owtenter_db::PersistenceWriter;
use owtenter_pipeline::adapters::OwServerConnector;
use owtenter_pipeline::ports::{AlertSink, WeatherSource};
use owtenter_pipeline::Pipeline;
use owtenter_weather::WeatherEnricher;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "owtenter_worker=info,owtenter_pipeline=info,owtenter_weather=info,\
     owtenter_db=info,owtenter_alerts=info,owtenter_owserver=info,owtenter_core=info";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match PipelineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        owserver = %format!("{}:{}", config.owserver.host, config.owserver.port),
        sensors = config.sensors.len(),
        weather = config.weather.is_some(),
        mail = config.mail.is_some(),
        table = %config.database.table,
        "Starting owtenter",
    );

    let weather = match &config.weather {
        Some(weather) => match WeatherEnricher::new(&weather.url) {
            Ok(enricher) => Some(enricher),
            Err(e) => {
                tracing::error!(error = %e, "Cannot build the weather client");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };
    let notifier = config
        .mail
        .clone()
        .map(|mail| EmailNotifier::new(mail, config.temperature_unit.clone()));

    let connector = OwServerConnector::new(&config.owserver);
    let writer = PersistenceWriter::new(config.database.clone());

    let mut pipeline = Pipeline::new(&config, &connector, &writer);
    if let Some(weather) = &weather {
        pipeline = pipeline.with_weather(weather as &dyn WeatherSource);
    }
    if let Some(notifier) = &notifier {
        pipeline = pipeline.with_alerts(notifier as &dyn AlertSink);
    }

    match pipeline.run_cycle().await {
        Ok(report) => {
            tracing::info!(
                readings = report.readings.len(),
                violations = report.violations.len(),
                "Cycle finished",
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(stage = %e.stage(), error = %e, "Cycle aborted");
            ExitCode::FAILURE
        }
    }
}
