//! Call activity feed.

use axum::extract::State;
use axum::Json;
use call_simulator::CallFeed;

use crate::error::Result;
use crate::identity::UserId;
use crate::state::AppState;

/// Feed entries, newest first, and the metrics.
pub async fn call_feed(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<CallFeed>> {
    let session = state.sessions.get_or_load(&user_id).await?;
    Ok(Json(session.calls.snapshot()))
}
