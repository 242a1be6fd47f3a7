//! Payment form and agent activation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use call_simulator::{ActivationPhase, PaymentDetails};
use serde::Serialize;

use crate::error::Result;
use crate::identity::UserId;
use crate::state::AppState;

/// Masked form values and whether the activate button is enabled.
#[derive(Debug, Serialize)]
pub struct PaymentPreview {
    #[serde(flatten)]
    pub details: PaymentDetails,
    pub enabled: bool,
}

/// Apply the input masks without starting anything.
pub async fn preview_payment(Json(details): Json<PaymentDetails>) -> Result<Json<PaymentPreview>> {
    let masked = details.masked()?;
    Ok(Json(PaymentPreview {
        enabled: masked.is_complete(),
        details: masked,
    }))
}

/// Submit the payment form.
///
/// Repeating the request after activation started returns the current phase.
pub async fn activate(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(details): Json<PaymentDetails>,
) -> Result<(StatusCode, Json<ActivationPhase>)> {
    let session = state.sessions.get_or_load(&user_id).await?;

    let current = session.activation.phase();
    if current.is_started() {
        return Ok((StatusCode::OK, Json(current)));
    }

    let business_id = session.business_id().await?;
    let phase = session.activation.activate(&business_id, &details).await?;
    Ok((StatusCode::ACCEPTED, Json(phase)))
}

/// Current activation phase.
pub async fn activation_status(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<ActivationPhase>> {
    let session = state.sessions.get_or_load(&user_id).await?;
    Ok(Json(session.activation.phase()))
}
