//! Store error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// The remote backend rejected or failed the request.
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A row came back in a shape we could not decode.
    #[error("malformed {entity} row: {message}")]
    Decode { entity: &'static str, message: String },

    /// A field value was rejected before reaching the backend.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl StoreError {
    /// Whether repeating the same request could succeed later.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Backend { status, .. } => *status >= 500 || *status == 429,
            StoreError::Sqlx(sqlx::Error::PoolTimedOut) | StoreError::Sqlx(sqlx::Error::Io(_)) => {
                true
            }
            _ => false,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
