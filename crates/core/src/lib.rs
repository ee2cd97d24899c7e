//! Domain types and pure logic of the owtenter poll cycle.
//!
//! Nothing in this crate performs I/O: readings are normalized, evaluated
//! against thresholds and turned into alert text here, while the bus,
//! weather, email and database clients live in their own crates.

pub mod alert;
pub mod config;
pub mod error;
pub mod normalize;
pub mod reading;
pub mod sensor;
pub mod thresholds;
pub mod types;
pub mod weather;
