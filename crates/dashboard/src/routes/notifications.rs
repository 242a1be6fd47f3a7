//! Failure notifications and retries.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use call_simulator::{Notification, RetryOutcome};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{DashboardError, Result};
use crate::identity::UserId;
use crate::state::AppState;

/// Pending notifications, oldest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<Vec<Notification>>> {
    let session = state.sessions.get_or_load(&user_id).await?;
    Ok(Json(session.notifications.list()))
}

/// Replay the write behind a notification.
pub async fn retry_notification(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<u64>,
) -> Result<Json<Value>> {
    let session = state.sessions.get_or_load(&user_id).await?;

    match session.notifications.retry(id, session.store()).await {
        Ok(RetryOutcome::Applied) => {
            info!(user_id = %user_id, notification = id, "Notification retried");
            Ok(Json(json!({ "id": id, "retried": true })))
        }
        Ok(RetryOutcome::NotRetryable) => Err(DashboardError::Conflict(format!(
            "notification {} has nothing to retry",
            id
        ))),
        Ok(RetryOutcome::Unknown) => Err(DashboardError::NotFound(format!("notification {}", id))),
        Err(err) => Err(DashboardError::RemoteWriteFailed {
            retryable: err.is_transient(),
            message: err.to_string(),
            notification: Some(id),
        }),
    }
}

/// Dismiss a notification.
pub async fn dismiss_notification(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    let session = state.sessions.get_or_load(&user_id).await?;
    if session.notifications.dismiss(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(DashboardError::NotFound(format!("notification {}", id)))
    }
}
