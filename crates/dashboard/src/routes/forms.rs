//! Business and agent form updates.

use axum::extract::State;
use axum::Json;
use profile_store::{AgentField, BusinessField};
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::identity::UserId;
use crate::session::FormMirror;
use crate::state::AppState;

/// One field edit. Field names may be camelCase or snake_case.
#[derive(Debug, Deserialize)]
pub struct FieldChange {
    pub field: String,
    /// Text, or a number for the response-length slider.
    pub value: Value,
}

impl FieldChange {
    fn value_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Change one business profile field.
pub async fn update_business(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(change): Json<FieldChange>,
) -> Result<Json<FormMirror>> {
    let field: BusinessField = change.field.parse()?;
    let session = state.sessions.get_or_load(&user_id).await?;
    let forms = session.set_business_field(field, &change.value_text()).await?;
    Ok(Json(forms))
}

/// Change one agent configuration field.
pub async fn update_agent(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(change): Json<FieldChange>,
) -> Result<Json<FormMirror>> {
    let field: AgentField = change.field.parse()?;
    let session = state.sessions.get_or_load(&user_id).await?;
    let forms = session.set_agent_field(field, &change.value_text()).await?;
    Ok(Json(forms))
}
