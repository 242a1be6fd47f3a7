//! Web dashboard for configuring and activating an AI call agent.
//!
//! Serves the dashboard page and the JSON API its controls call. Uploads,
//! activation and the call feed are simulated per user session.

mod config;
mod error;
mod identity;
mod routes;
mod session;
mod state;

use std::sync::Arc;
use std::time::Duration;

use call_simulator::SimulationTiming;
use profile_store::{Database, MemoryStore, ProfileStore};
use rest_store::RestStore;
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, ConfigError, StoreBackend};
use crate::state::AppState;

/// Open the configured store.
async fn open_store(config: &Config) -> Result<Arc<dyn ProfileStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn ProfileStore> = match config.backend {
        StoreBackend::Sqlite => {
            let db = Database::connect(&config.database_url).await?;
            db.migrate().await?;
            Arc::new(db)
        }
        StoreBackend::Rest => {
            let rest = config
                .rest
                .clone()
                .ok_or(ConfigError::Missing("SUPABASE_URL"))?;
            Arc::new(RestStore::connect(rest).await?)
        }
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

/// How often idle sessions are looked for.
fn sweep_interval(idle: Duration) -> Duration {
    (idle / 4).clamp(Duration::from_secs(1), Duration::from_secs(60))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, backend = ?config.backend, "Starting dashboard server");

    let store = open_store(&config).await?;
    let timing = SimulationTiming::default().scaled(config.time_scale);

    // Build application state
    let state = AppState::new(
        store,
        timing,
        config.default_user.clone(),
        config.session_idle,
    );
    let sessions = state.sessions.clone();
    let sweeper = sessions.spawn_sweeper(sweep_interval(config.session_idle));

    // Build router
    let app = routes::router()
        .nest_service("/static", ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")))
        .with_state(state);

    // Start server
    info!(addr = %config.addr, "Dashboard server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", err);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    sweeper.abort();
    let aborted = sessions.teardown_all().await;
    info!(aborted, "Dashboard server stopped");

    Ok(())
}
