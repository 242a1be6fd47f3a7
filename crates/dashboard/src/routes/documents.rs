//! Knowledge document uploads.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use call_simulator::UploadView;
use profile_store::validation::validate_document_type;
use serde::Deserialize;

use crate::error::Result;
use crate::identity::UserId;
use crate::state::AppState;

/// Metadata of the picked file.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub file_name: String,
    /// MIME type reported by the browser; may be empty.
    #[serde(default)]
    pub content_type: String,
}

/// Start a simulated upload.
pub async fn start_upload(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(req): Json<UploadRequest>,
) -> Result<(StatusCode, Json<UploadView>)> {
    // Reject before the profile is created.
    validate_document_type(&req.file_name, &req.content_type)?;

    let session = state.sessions.get_or_load(&user_id).await?;
    let business_id = session.business_id().await?;
    let view = session
        .uploads
        .start(&business_id, &req.file_name, &req.content_type)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(view)))
}

/// The surfaced document, or `null`.
pub async fn latest_document(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<Option<UploadView>>> {
    let session = state.sessions.get_or_load(&user_id).await?;
    Ok(Json(session.uploads.current()))
}
