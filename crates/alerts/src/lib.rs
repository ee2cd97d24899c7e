//! Threshold alert delivery.
//!
//! - [`EmailNotifier`] sends one plain-text email per cycle listing every
//!   violation, over an authenticated STARTTLS SMTP session.

pub mod email;

pub use email::{EmailError, EmailNotifier};
