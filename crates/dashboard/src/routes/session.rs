//! Session teardown.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::identity::UserId;
use crate::state::AppState;

/// Drop the caller's session and abort its timelines.
///
/// The next request loads a fresh session from the store.
pub async fn end_session(State(state): State<AppState>, UserId(user_id): UserId) -> Json<Value> {
    let aborted = state.sessions.teardown(&user_id).await;
    Json(json!({ "aborted": aborted }))
}
