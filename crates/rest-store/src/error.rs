//! Error types for rest-store.

use profile_store::StoreError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the PostgREST backend.
#[derive(Debug, Error)]
pub enum RestError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response from the backend.
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Health check failed.
    #[error("Health check failed")]
    HealthCheckFailed,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RestError {
    /// Whether the backend reported a unique-constraint conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RestError::Status { status, .. } if *status == StatusCode::CONFLICT)
    }
}

impl From<RestError> for StoreError {
    fn from(err: RestError) -> Self {
        match err {
            RestError::Http(e) if e.is_decode() => StoreError::Decode {
                entity: "row",
                message: e.to_string(),
            },
            RestError::Http(e) => StoreError::Unavailable(e.to_string()),
            RestError::Json(e) => StoreError::Decode {
                entity: "row",
                message: e.to_string(),
            },
            RestError::Status { status, body } => StoreError::Backend {
                status: status.as_u16(),
                message: body,
            },
            RestError::HealthCheckFailed => StoreError::Unavailable("health check failed".into()),
            RestError::Config(msg) => StoreError::Unavailable(msg),
        }
    }
}
