//! Route handlers for the dashboard.

pub mod activation;
pub mod calls;
pub mod dashboard;
pub mod documents;
pub mod forms;
pub mod health;
pub mod notifications;
pub mod session;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // HTML pages
        .route("/", get(dashboard::dashboard_page))
        // Health check
        .route("/health", get(health::health))
        // API endpoints
        .route("/api/dashboard", get(dashboard::dashboard_api))
        .route("/api/business", put(forms::update_business))
        .route("/api/agent", put(forms::update_agent))
        .route("/api/documents", post(documents::start_upload))
        .route("/api/documents/latest", get(documents::latest_document))
        .route("/api/payment/preview", post(activation::preview_payment))
        .route(
            "/api/activation",
            get(activation::activation_status).post(activation::activate),
        )
        .route("/api/calls", get(calls::call_feed))
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/:id",
            delete(notifications::dismiss_notification),
        )
        .route(
            "/api/notifications/:id/retry",
            post(notifications::retry_notification),
        )
        .route("/api/session", delete(session::end_session))
}
