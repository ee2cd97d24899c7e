//! Typed single-row INSERT builder.
//!
//! Table and column names come from configuration and sensor ids, so they
//! are never interpolated raw: each one is validated and double-quoted here,
//! with embedded quotes doubled. Values are always bound as parameters.

use std::collections::HashSet;

use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

use owtenter_core::types::Timestamp;

use crate::error::PersistError;

/// PostgreSQL silently truncates longer identifiers (NAMEDATALEN - 1).
const MAX_IDENTIFIER_LEN: usize = 63;

/// A value bound to one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Integer(i64),
    Float(f64),
    Timestamp(Timestamp),
    Json(serde_json::Value),
}

/// Quote `name` as a PostgreSQL identifier.
pub fn quote_identifier(name: &str) -> Result<String, PersistError> {
    let invalid = |reason| PersistError::InvalidIdentifier {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("empty"));
    }
    if name.contains('\0') {
        return Err(invalid("contains a NUL character"));
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(invalid("longer than 63 bytes"));
    }

    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Collects `(column, value)` pairs in order for one table.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    columns: Vec<(String, ColumnValue)>,
}

impl InsertBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, value: ColumnValue) -> Self {
        self.columns.push((name.into(), value));
        self
    }

    /// Validate every identifier and render the statement.
    pub fn build(self) -> Result<InsertStatement, PersistError> {
        if self.columns.is_empty() {
            return Err(PersistError::EmptyRecord);
        }

        let table = quote_identifier(&self.table)?;

        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(self.columns.len());
        let mut placeholders = Vec::with_capacity(self.columns.len());
        let mut values = Vec::with_capacity(self.columns.len());

        for (idx, (name, value)) in self.columns.into_iter().enumerate() {
            if !seen.insert(name.clone()) {
                return Err(PersistError::DuplicateColumn(name));
            }
            names.push(quote_identifier(&name)?);
            placeholders.push(format!("${}", idx + 1));
            values.push(value);
        }

        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            names.join(", "),
            placeholders.join(", ")
        );

        Ok(InsertStatement { sql, values })
    }
}

/// A rendered INSERT with its values in placeholder order.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    sql: String,
    values: Vec<ColumnValue>,
}

impl InsertStatement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[ColumnValue] {
        &self.values
    }

    /// The statement as an sqlx query with every value bound.
    pub fn query(&self) -> Query<'_, Postgres, PgArguments> {
        self.values.iter().fold(sqlx::query(&self.sql), bind_value)
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &ColumnValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        ColumnValue::Integer(v) => query.bind(*v),
        ColumnValue::Float(v) => query.bind(*v),
        ColumnValue::Timestamp(v) => query.bind(*v),
        ColumnValue::Json(v) => query.bind(sqlx::types::Json(v.clone())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn renders_quoted_identifiers_and_placeholders() {
        let statement = InsertBuilder::new("readings")
            .column("attic_temperature", ColumnValue::Float(21.4))
            .column("bath_humidity", ColumnValue::Integer(55))
            .build()
            .unwrap();

        assert_eq!(
            statement.sql(),
            r#"INSERT INTO "readings" ("attic_temperature", "bath_humidity") VALUES ($1, $2)"#
        );
        assert_eq!(
            statement.values(),
            &[ColumnValue::Float(21.4), ColumnValue::Integer(55)]
        );
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(quote_identifier(r#"x"); DROP TABLE t; --"#).unwrap(), r#""x""); DROP TABLE t; --""#);
        assert_eq!(quote_identifier("Mixed Case").unwrap(), r#""Mixed Case""#);
    }

    #[test]
    fn unsafe_identifiers_are_rejected() {
        assert_matches!(quote_identifier(""), Err(PersistError::InvalidIdentifier { .. }));
        assert_matches!(quote_identifier("a\0b"), Err(PersistError::InvalidIdentifier { .. }));
        assert_matches!(
            quote_identifier(&"a".repeat(64)),
            Err(PersistError::InvalidIdentifier { .. })
        );
        assert!(quote_identifier(&"a".repeat(63)).is_ok());
    }

    #[test]
    fn invalid_table_name_is_rejected() {
        let result = InsertBuilder::new("")
            .column("a", ColumnValue::Integer(1))
            .build();
        assert_matches!(result, Err(PersistError::InvalidIdentifier { .. }));
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let result = InsertBuilder::new("readings")
            .column("timestamp", ColumnValue::Integer(1))
            .column("timestamp", ColumnValue::Integer(2))
            .build();
        assert_matches!(result, Err(PersistError::DuplicateColumn(name)) if name == "timestamp");
    }

    #[test]
    fn empty_record_is_rejected() {
        assert_matches!(InsertBuilder::new("readings").build(), Err(PersistError::EmptyRecord));
    }
}
