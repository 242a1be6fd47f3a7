//! Error types for the dashboard API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use call_simulator::SimulationError;
use profile_store::{StoreError, ValidationError};
use serde_json::json;
use thiserror::Error;

/// Errors returned by dashboard handlers.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Input rejected; shown next to `field`.
    #[error("{message}")]
    ValidationFailed { field: String, message: String },

    /// A write did not reach the store. The user may retry it when `retryable`.
    #[error("Remote write failed: {message}")]
    RemoteWriteFailed {
        message: String,
        /// Whether the failure looks transient.
        retryable: bool,
        /// Notification holding the write, when one was recorded.
        notification: Option<u64>,
    },

    /// Reading the user's records failed.
    #[error("Store error: {0}")]
    StoreRead(StoreError),

    /// No `x-user-id` header and no configured fallback.
    #[error("Missing user identity")]
    MissingIdentity,

    #[error("{0} not found")]
    NotFound(String),

    /// The request conflicts with work already in progress.
    #[error("{0}")]
    Conflict(String),
}

impl DashboardError {
    fn kind(&self) -> &'static str {
        match self {
            DashboardError::ValidationFailed { .. } => "validation_failed",
            DashboardError::RemoteWriteFailed { .. } => "remote_write_failed",
            DashboardError::StoreRead(_) => "store_unavailable",
            DashboardError::MissingIdentity => "unauthorized",
            DashboardError::NotFound(_) => "not_found",
            DashboardError::Conflict(_) => "conflict",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            DashboardError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            DashboardError::RemoteWriteFailed { .. } | DashboardError::StoreRead(_) => {
                StatusCode::BAD_GATEWAY
            }
            DashboardError::MissingIdentity => StatusCode::UNAUTHORIZED,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl From<ValidationError> for DashboardError {
    fn from(err: ValidationError) -> Self {
        DashboardError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<SimulationError> for DashboardError {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::Validation(err) => err.into(),
            SimulationError::RemoteWrite(err) => DashboardError::RemoteWriteFailed {
                retryable: err.is_transient(),
                message: err.to_string(),
                notification: None,
            },
            SimulationError::Busy(_) | SimulationError::Closed => {
                DashboardError::Conflict(err.to_string())
            }
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        let body = match &self {
            DashboardError::ValidationFailed { field, .. } => {
                tracing::debug!(field = %field, "Validation failed: {}", message);
                json!({ "error": message, "kind": self.kind(), "field": field })
            }
            DashboardError::RemoteWriteFailed {
                notification,
                retryable,
                ..
            } => {
                tracing::warn!("{}", message);
                json!({
                    "error": message,
                    "kind": self.kind(),
                    "retryable": retryable,
                    "notification": notification,
                })
            }
            DashboardError::StoreRead(err) => {
                tracing::error!("Store error: {}", err);
                json!({ "error": message, "kind": self.kind() })
            }
            _ => json!({ "error": message, "kind": self.kind() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for dashboard handlers.
pub type Result<T> = std::result::Result<T, DashboardError>;
