//! Dashboard page and snapshot.

use askama::Template;
use axum::extract::State;
use axum::Json;
use call_simulator::{ActivationPhase, CallFeed, Notification, UploadView};
use profile_store::models::BUSINESS_CATEGORIES;
use profile_store::{Language, ResponseLength, ResponseTone};
use serde::Serialize;

use crate::error::Result;
use crate::identity::UserId;
use crate::session::{FormMirror, Session};
use crate::state::AppState;

/// Everything the page shows, as JSON.
#[derive(Clone, Serialize)]
pub struct DashboardView {
    pub user_id: String,
    #[serde(flatten)]
    pub forms: FormMirror,
    pub upload: Option<UploadView>,
    pub activation: ActivationPhase,
    pub calls: CallFeed,
    pub notifications: Vec<Notification>,
}

impl DashboardView {
    pub async fn of(session: &Session) -> Self {
        Self {
            user_id: session.user_id.clone(),
            forms: session.forms.lock().await.clone(),
            upload: session.uploads.current(),
            activation: session.activation.phase(),
            calls: session.calls.snapshot(),
            notifications: session.notifications.list(),
        }
    }
}

/// One `<option>` of a select.
pub struct Choice {
    pub value: &'static str,
    pub selected: bool,
}

fn choices(values: impl IntoIterator<Item = &'static str>, current: &str) -> Vec<Choice> {
    values
        .into_iter()
        .map(|value| Choice {
            value,
            selected: value == current,
        })
        .collect()
}

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub view: DashboardView,
    pub categories: Vec<Choice>,
    pub tones: Vec<Choice>,
    pub languages: Vec<Choice>,
    pub length_position: u8,
    pub activation_label: &'static str,
    pub phone_number: Option<String>,
}

impl DashboardTemplate {
    fn new(view: DashboardView) -> Self {
        let business = &view.forms.business;
        let agent = &view.forms.agent;

        let activation_label = match &view.activation {
            ActivationPhase::Form | ActivationPhase::FailedValidation { .. } => "Not active",
            ActivationPhase::Verifying => "Verifying payment…",
            ActivationPhase::Success => "Payment successful",
            ActivationPhase::Activated { .. } => "Active",
        };

        Self {
            categories: choices(BUSINESS_CATEGORIES, &business.business_category),
            tones: choices(
                ResponseTone::ALL.iter().map(|t| t.as_str()),
                agent.response_tone.as_str(),
            ),
            languages: choices(
                Language::ALL.iter().map(|l| l.as_str()),
                agent.language.as_str(),
            ),
            length_position: agent.max_response_length.slider_position(),
            activation_label,
            phone_number: view.activation.phone_number().map(str::to_string),
            view,
        }
    }

    /// Label under the response-length slider.
    pub fn length_label(&self) -> &'static str {
        ResponseLength::from_slider(self.length_position)
            .unwrap_or_default()
            .as_str()
    }
}

/// Render the dashboard page.
pub async fn dashboard_page(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<DashboardTemplate> {
    let session = state.sessions.get_or_load(&user_id).await?;
    Ok(DashboardTemplate::new(DashboardView::of(&session).await))
}

/// Get the dashboard snapshot as JSON.
pub async fn dashboard_api(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<DashboardView>> {
    let session = state.sessions.get_or_load(&user_id).await?;
    Ok(Json(DashboardView::of(&session).await))
}
