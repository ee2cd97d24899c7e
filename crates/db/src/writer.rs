//! Writes a cycle's record to the configured table.

use owtenter_core::config::DatabaseConfig;

use crate::error::PersistError;
use crate::record::PersistRecord;
use crate::{create_pool, DbPool};

pub struct PersistenceWriter {
    config: DatabaseConfig,
}

impl PersistenceWriter {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    /// Insert `record` as one row, in its own transaction.
    ///
    /// The statement is rendered before connecting, so an invalid identifier
    /// never opens a connection. There is no retry.
    pub async fn persist(&self, record: &PersistRecord) -> Result<(), PersistError> {
        let statement = record.to_insert(&self.config.table)?;

        let pool = create_pool(&self.config).await.map_err(|e| {
            tracing::error!(
                host = %self.config.host,
                port = self.config.port,
                database = %self.config.database,
                error = %e,
                "Database connection failed",
            );
            PersistError::Connect(e)
        })?;

        let result = insert(&pool, statement.query()).await;
        pool.close().await;

        match &result {
            Ok(()) => tracing::info!(table = %self.config.table, "Record persisted"),
            Err(e) => tracing::error!(table = %self.config.table, error = %e, "Insert failed"),
        }
        result.map_err(PersistError::Insert)
    }
}

async fn insert(
    pool: &DbPool,
    query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    query.execute(&mut *tx).await?;
    tx.commit().await
}
