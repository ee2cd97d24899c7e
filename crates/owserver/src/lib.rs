//! Async client for owserver, the TCP proxy in front of a 1-Wire bus.
//!
//! Only the two messages a poller needs are implemented: `NOP`, to check
//! the server at connect time, and `READ`, to fetch a sensor value by path.

pub mod client;
pub mod protocol;

pub use client::{OwError, OwProxy};
