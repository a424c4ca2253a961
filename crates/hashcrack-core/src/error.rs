//! Typed errors shared by `master` and `minion`.

use thiserror::Error;

/// Errors that can occur anywhere in the hashcrack job pipeline.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The relational store rejected or failed a query.
    #[error("database error: {0}")]
    Database(String),
    /// The message broker rejected a publish or connect.
    #[error("broker error: {0}")]
    Broker(String),
    /// A referenced job does not exist.
    #[error("job not found: {0}")]
    NotFound(uuid::Uuid),
    /// A referential-integrity or state invariant was violated.
    #[error("invariant violation: {0}")]
    Invariant(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(e: sqlx::Error) -> Self {
        CoreError::Database(e.to_string())
    }
}
