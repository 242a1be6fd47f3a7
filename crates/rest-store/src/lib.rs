//! PostgREST backend for the dashboard's profile store.
//!
//! Talks to a Supabase-style `rest/v1` API. Row ownership is enforced by the
//! backend through the access token; this crate only addresses tables.
//!
//! # Example
//!
//! ```no_run
//! use profile_store::{BusinessField, ProfileStore};
//! use rest_store::{RestConfig, RestStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RestConfig::new("https://abc.supabase.co", "anon-key")
//!     .with_access_token("user-jwt");
//! let store = RestStore::connect(config).await?;
//!
//! store
//!     .upsert_business_field("user-1", BusinessField::SupportPhone, "+1 555 123 4567")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
mod store;

pub use client::RestStore;
pub use config::RestConfig;
pub use error::RestError;
