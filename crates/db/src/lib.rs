//! Persistence of one row per poll cycle.
//!
//! - [`insert`] builds the parameterized INSERT and is the only place SQL
//!   identifiers are validated and quoted.
//! - [`record`] derives the row's columns from a cycle's readings.
//! - [`writer`] connects, inserts in a transaction and releases the connection.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use owtenter_core::config::DatabaseConfig;

pub mod error;
pub mod insert;
pub mod record;
pub mod writer;

pub use error::PersistError;
pub use insert::{ColumnValue, InsertBuilder, InsertStatement};
pub use record::PersistRecord;
pub use writer::PersistenceWriter;

pub type DbPool = sqlx::PgPool;

/// Bound on establishing the database connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a single-connection pool to the configured database.
///
/// The connection is established eagerly, so an unreachable server or bad
/// credentials fail here rather than at insert time.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .username(&config.user)
        .password(&config.password);

    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect_with(options)
        .await
}
