//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use rest_store::RestConfig;

use crate::session::DEFAULT_IDLE_TIMEOUT;

/// Where records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Local SQLite file.
    Sqlite,
    /// Hosted PostgREST tables.
    Rest,
    /// Process memory; lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "rest" | "supabase" => Ok(StoreBackend::Rest),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::InvalidBackend(s.to_string())),
        }
    }
}

/// Dashboard server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    pub backend: StoreBackend,
    /// SQLite database URL.
    pub database_url: String,
    /// Hosted backend settings, present when `backend` is `Rest`.
    pub rest: Option<RestConfig>,
    /// Identity used when a request carries no `x-user-id` header.
    pub default_user: Option<String>,
    /// Factor applied to every simulation delay.
    pub time_scale: f64,
    /// Sessions without a request for this long are torn down.
    pub session_idle: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `DASHBOARD_ADDR` | Server bind address | `127.0.0.1:8788` |
    /// | `STORE_BACKEND` | `sqlite`, `rest` or `memory` | `sqlite` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:dashboard.db?mode=rwc` |
    /// | `SUPABASE_URL` | Hosted backend URL | (required for `rest`) |
    /// | `SUPABASE_ANON_KEY` | Hosted backend API key | (required for `rest`) |
    /// | `SUPABASE_ACCESS_TOKEN` | Signed-in user's token | (optional) |
    /// | `DASHBOARD_USER_ID` | Fallback user identity | (optional) |
    /// | `SIMULATION_TIME_SCALE` | Delay multiplier | `1.0` |
    /// | `SESSION_IDLE_SECS` | Idle session lifetime | `1800` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("DASHBOARD_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8788".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let backend = match lookup("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => StoreBackend::Sqlite,
        };

        let database_url =
            lookup("SQLITE_PATH").unwrap_or_else(|| "sqlite:dashboard.db?mode=rwc".to_string());

        let rest = if backend == StoreBackend::Rest {
            let url = lookup("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
            let key =
                lookup("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;
            let mut rest = RestConfig::new(&url, &key);
            if let Some(token) = lookup("SUPABASE_ACCESS_TOKEN").filter(|t| !t.is_empty()) {
                rest = rest.with_access_token(&token);
            }
            Some(rest)
        } else {
            None
        };

        let default_user = lookup("DASHBOARD_USER_ID").filter(|u| !u.trim().is_empty());

        let time_scale = match lookup("SIMULATION_TIME_SCALE") {
            Some(value) => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .ok_or(ConfigError::InvalidTimeScale(value))?,
            None => 1.0,
        };

        let session_idle = match lookup("SESSION_IDLE_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidSessionIdle(value))?,
            None => DEFAULT_IDLE_TIMEOUT,
        };

        Ok(Self {
            addr,
            backend,
            database_url,
            rest,
            default_user,
            time_scale,
            session_idle,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid DASHBOARD_ADDR format")]
    InvalidAddr,

    #[error("Invalid STORE_BACKEND '{0}' (expected sqlite, rest or memory)")]
    InvalidBackend(String),

    #[error("{0} environment variable is required for the rest backend")]
    Missing(&'static str),

    #[error("Invalid SIMULATION_TIME_SCALE '{0}'")]
    InvalidTimeScale(String),

    #[error("Invalid SESSION_IDLE_SECS '{0}' (expected a positive number of seconds)")]
    InvalidSessionIdle(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.addr.to_string(), "127.0.0.1:8788");
        assert_eq!(config.backend, StoreBackend::Sqlite);
        assert_eq!(config.database_url, "sqlite:dashboard.db?mode=rwc");
        assert!(config.rest.is_none());
        assert!(config.default_user.is_none());
        assert_eq!(config.time_scale, 1.0);
        assert_eq!(config.session_idle, Duration::from_secs(1800));
    }

    #[test]
    fn test_rest_backend_requires_credentials() {
        let err = Config::from_lookup(lookup(&[("STORE_BACKEND", "rest")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SUPABASE_URL")));

        let config = Config::from_lookup(lookup(&[
            ("STORE_BACKEND", "rest"),
            ("SUPABASE_URL", "https://example.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();
        let rest = config.rest.unwrap();
        assert_eq!(rest.base_url, "https://example.supabase.co");
        assert!(rest.access_token.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("DASHBOARD_ADDR", "nope")])),
            Err(ConfigError::InvalidAddr)
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("STORE_BACKEND", "postgres")])),
            Err(ConfigError::InvalidBackend(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("SIMULATION_TIME_SCALE", "-2")])),
            Err(ConfigError::InvalidTimeScale(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("SESSION_IDLE_SECS", "0")])),
            Err(ConfigError::InvalidSessionIdle(_))
        ));
    }

    #[test]
    fn test_memory_backend_and_user() {
        let config = Config::from_lookup(lookup(&[
            ("STORE_BACKEND", "Memory"),
            ("DASHBOARD_USER_ID", "demo-user"),
            ("SIMULATION_TIME_SCALE", "0.1"),
            ("SESSION_IDLE_SECS", "90"),
        ]))
        .unwrap();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.default_user.as_deref(), Some("demo-user"));
        assert_eq!(config.time_scale, 0.1);
        assert_eq!(config.session_idle, Duration::from_secs(90));
    }
}
