//! Caller identity.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::DashboardError;
use crate::state::AppState;

/// Header naming the signed-in user.
pub const USER_HEADER: &str = "x-user-id";

/// The user a request acts for: the `x-user-id` header, else the configured default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

#[axum::async_trait]
impl FromRequestParts<AppState> for UserId {
    type Rejection = DashboardError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match (header, state.default_user.as_deref()) {
            (Some(user), _) | (None, Some(user)) => Ok(UserId(user.to_string())),
            (None, None) => Err(DashboardError::MissingIdentity),
        }
    }
}
