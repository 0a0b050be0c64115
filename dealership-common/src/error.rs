//! Common error types for the dealership services

use thiserror::Error;

/// Common result type for dealership operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across dealership crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record failed a range or shape rule before reaching the store
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Uniqueness constraint violated (duplicate make, model-year or username)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Translate a sqlx error, turning SQLite UNIQUE violations into `Conflict`
    pub fn from_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Error::Conflict(format!("{} already exists", what));
            }
            if db_err.is_check_violation() || db_err.is_foreign_key_violation() {
                return Error::InvalidInput(format!("{}: {}", what, db_err.message()));
            }
        }
        Error::Database(err)
    }

    /// True for uniqueness conflicts
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}
