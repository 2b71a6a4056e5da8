//! # Database Errors
//!
//! [`DbError`] classifies what went wrong in SQLite so callers can branch on
//! it. The engine folds these into its backend-neutral `StoreError`, and the
//! deletion path in particular depends on telling a foreign key refusal apart
//! from everything else.

use std::time::Duration;

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// ## When This Occurs
    /// - The id does not exist
    /// - A concurrent hard delete removed the row first
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// ## When This Occurs
    /// - Inserting a product whose SKU or slug is taken
    /// - Listing the same component twice for one pack
    #[error("Duplicate {field}")]
    UniqueViolation { field: String },

    /// ## When This Occurs
    /// - Hard-deleting a product that order items, packs or components
    ///   still reference
    /// - Inserting a row that points at a missing product or order
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// ## When This Occurs
    /// - A stock counter or `quantity_per_pack` would leave its allowed range
    #[error("Check constraint failed: {message}")]
    CheckViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A deletion budget ran out and the transaction was rolled back.
    ///
    /// ## When This Occurs
    /// - No connection could be acquired within `max_wait`
    /// - The transaction body ran past `timeout`
    #[error("{operation} exceeded its {}ms budget", budget.as_millis())]
    Timeout {
        operation: &'static str,
        budget: Duration,
    },

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, DbError::ForeignKeyViolation { .. })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    // SQLite reports "UNIQUE constraint failed: <table>.<column>"
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        field: message
                            .rsplit(": ")
                            .next()
                            .unwrap_or("unknown")
                            .to_string(),
                    },
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::CheckViolation => DbError::CheckViolation { message },
                    _ => DbError::QueryFailed(message),
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = DbError::Timeout {
            operation: "hard delete",
            budget: Duration::from_millis(5000),
        };
        assert_eq!(err.to_string(), "hard delete exceeded its 5000ms budget");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert!(!err.is_foreign_key_violation());
    }

    #[test]
    fn test_pool_errors() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::PoolExhausted));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }
}
