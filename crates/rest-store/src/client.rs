//! PostgREST HTTP client.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::RestConfig;
use crate::error::RestError;

/// `Prefer` header asking for the written rows back.
const RETURN_REPRESENTATION: &str = "return=representation";

/// `Prefer` header turning a POST into an upsert that merges columns.
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

/// Build a PostgREST equality filter value.
pub fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// Build a PostgREST less-than-or-equal filter value.
pub fn lte(value: impl std::fmt::Display) -> String {
    format!("lte.{}", value)
}

/// Build a PostgREST membership filter value.
pub fn in_list<I, T>(values: I) -> String
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let values: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
    format!("in.({})", values.join(","))
}

/// Client for a PostgREST (Supabase `rest/v1`) backend.
#[derive(Clone)]
pub struct RestStore {
    http: Client,
    config: RestConfig,
}

impl RestStore {
    /// Build a client without contacting the backend.
    pub fn new(config: RestConfig) -> Result<Self, RestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&config.api_key)
                .map_err(|_| RestError::Config("API key is not a valid header value".into()))?,
        );
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.bearer()))
            .map_err(|_| RestError::Config("access token is not a valid header value".into()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(RestError::Http)?;

        Ok(Self { http, config })
    }

    /// Build a client and verify the backend answers.
    pub async fn connect(config: RestConfig) -> Result<Self, RestError> {
        let store = Self::new(config)?;

        if store.health_check().await? {
            info!("Connected to REST backend at {}", store.config.base_url);
            Ok(store)
        } else {
            Err(RestError::HealthCheckFailed)
        }
    }

    /// Perform a health check against the backend.
    pub async fn health_check(&self) -> Result<bool, RestError> {
        let url = self.config.check_url();
        debug!("Health check: {}", url);

        let resp = self.http.get(&url).send().await?;
        Ok(resp.status().is_success())
    }

    /// Get the configuration.
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// Fetch at most one row matching the filters.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Option<T>, RestError> {
        let request = self
            .http
            .get(self.config.table_url(table))
            .query(&[("select", "*"), ("limit", "1")])
            .query(filters);

        let rows: Vec<T> = Self::send(table, "select", request).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    /// Fetch the newest row matching the filters, ordered by `order_column` descending.
    pub async fn select_latest<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        order_column: &str,
    ) -> Result<Option<T>, RestError> {
        let order = format!("{}.desc", order_column);
        let request = self
            .http
            .get(self.config.table_url(table))
            .query(&[("select", "*"), ("order", order.as_str()), ("limit", "1")])
            .query(filters);

        let rows: Vec<T> = Self::send(table, "select_latest", request).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row and return it as stored.
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, RestError> {
        let request = self
            .http
            .post(self.config.table_url(table))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body);

        let rows: Vec<T> = Self::send(table, "insert", request).await?.json().await?;
        Self::single(table, rows)
    }

    /// Insert or merge one row keyed by a unique column, returning it as stored.
    ///
    /// Only the columns present in `body` are written on conflict.
    pub async fn upsert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        on_conflict: &str,
        body: &B,
    ) -> Result<T, RestError> {
        let request = self
            .http
            .post(self.config.table_url(table))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", MERGE_DUPLICATES)
            .json(body);

        let rows: Vec<T> = Self::send(table, "upsert", request).await?.json().await?;
        Self::single(table, rows)
    }

    /// Patch every row matching the filters. Returns the number of rows changed.
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
    ) -> Result<usize, RestError> {
        let request = self
            .http
            .patch(self.config.table_url(table))
            .query(filters)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body);

        let rows: Vec<serde_json::Value> =
            Self::send(table, "update", request).await?.json().await?;
        Ok(rows.len())
    }

    async fn send(table: &str, op: &str, request: RequestBuilder) -> Result<Response, RestError> {
        debug!(table, op, "REST request");

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestError::Status { status, body });
        }
        Ok(response)
    }

    fn single<T>(table: &str, rows: Vec<T>) -> Result<T, RestError> {
        rows.into_iter().next().ok_or_else(|| RestError::Status {
            status: reqwest::StatusCode::NO_CONTENT,
            body: format!("{} write returned no rows", table),
        })
    }
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("config", &self.config)
            .finish()
    }
}
