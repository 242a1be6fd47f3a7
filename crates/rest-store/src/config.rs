//! Configuration types for rest-store.

use std::time::Duration;

/// Configuration for connecting to a PostgREST (Supabase) backend.
#[derive(Clone)]
pub struct RestConfig {
    /// Project base URL (e.g., "https://abc.supabase.co").
    pub base_url: String,
    /// Public API key sent as the `apikey` header.
    pub api_key: String,
    /// Signed-in user's access token. Row ownership is enforced with it;
    /// without one the API key is used as the bearer.
    pub access_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RestConfig {
    /// Create a new configuration with the given base URL and API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Use a user access token for row-level ownership.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the endpoint URL for a table.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Get the health check endpoint URL.
    pub fn check_url(&self) -> String {
        format!("{}/rest/v1/", self.base_url)
    }

    /// Token sent in the `Authorization` header.
    pub fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self::new("http://localhost:54321", "")
    }
}

// Keys stay out of logs.
impl std::fmt::Debug for RestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestConfig")
            .field("base_url", &self.base_url)
            .field("has_access_token", &self.access_token.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}
