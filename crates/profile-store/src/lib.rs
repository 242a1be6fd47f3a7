//! Record storage for the call-agent dashboard.
//!
//! The dashboard keeps four tables per user: the business profile, the agent
//! configuration, the activation status and the uploaded knowledge documents.
//! [`ProfileStore`] is the seam every backend implements:
//!
//! - [`Database`]: SQLite via SQLx, for local development
//! - [`MemoryStore`]: in-process tables, for tests and offline demos
//! - `rest_store::RestStore`: the hosted PostgREST backend (separate crate)
//!
//! # Example
//!
//! ```no_run
//! use profile_store::{BusinessField, Database, ProfileStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:dashboard.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let profile = db
//!         .upsert_business_field("user-1", BusinessField::CompanyName, "ABC Insurance")
//!         .await?;
//!     println!("profile {}", profile.id);
//!
//!     Ok(())
//! }
//! ```

pub mod activation;
pub mod agent_config;
pub mod business;
pub mod document;
pub mod error;
pub mod fields;
pub mod memory;
pub mod models;
mod sqlite;
pub mod store;
pub mod validation;

pub use async_trait::async_trait;
pub use error::{Result, StoreError};
pub use fields::{AgentField, BusinessField};
pub use memory::MemoryStore;
pub use models::{
    ActivationRecord, ActivationStatus, AgentConfig, AgentConfigRecord, BusinessProfile,
    BusinessProfileRecord, DocumentStatus, KnowledgeDocument, Language, ResponseLength,
    ResponseTone,
};
pub use store::{load_snapshot, tables, DashboardSnapshot, ProfileStore};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 5;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(url, pool_size, "Connected to database");

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
