/// Every variant ends the cycle.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Invalid SQL identifier {name:?}: {reason}")]
    InvalidIdentifier { name: String, reason: &'static str },

    #[error("Column {0:?} appears more than once in the record")]
    DuplicateColumn(String),

    #[error("Record has no columns to insert")]
    EmptyRecord,

    #[error("Database connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Insert failed: {0}")]
    Insert(#[source] sqlx::Error),
}
