//! The owtenter poll cycle.
//!
//! [`Pipeline::run_cycle`] sequences one cycle:
//!
//! ```text
//! connect → read all → retry failed (once) → normalize → no-data check
//!         → [fetch weather] → evaluate thresholds → [notify] → persist
//! ```
//!
//! Connecting to the sensor network, an empty reading set and persistence
//! failures end the cycle with a [`PipelineError`]. Everything else
//! degrades the cycle's data and lets it complete.
//!
//! External systems sit behind the traits in [`ports`]; [`adapters`] binds
//! them to the owserver, weather, email and database clients.

pub mod adapters;
pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod reader;

pub use error::PipelineError;
pub use orchestrator::{AlertOutcome, CycleReport, Pipeline, Stage};
pub use reader::{PassResult, ReadOutcome, SensorReader};
