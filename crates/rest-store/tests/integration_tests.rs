//! Integration tests for rest-store.
//!
//! Tests marked `#[ignore]` need a running PostgREST/Supabase backend with the
//! dashboard tables and these env vars:
//! - `SUPABASE_URL`
//! - `SUPABASE_ANON_KEY`
//! - `SUPABASE_ACCESS_TOKEN` (optional)
//!
//! Run them with:
//!   cargo test -p rest-store --test integration_tests -- --ignored

use std::env;
use std::time::Duration;

use profile_store::{BusinessField, DocumentStatus, ProfileStore};
use rest_store::{RestConfig, RestStore};

fn live_config() -> Option<RestConfig> {
    let _ = dotenvy::dotenv();
    let url = env::var("SUPABASE_URL").ok()?;
    let key = env::var("SUPABASE_ANON_KEY").ok()?;
    let config = RestConfig::new(url, key);
    Some(match env::var("SUPABASE_ACCESS_TOKEN") {
        Ok(token) => config.with_access_token(token),
        Err(_) => config,
    })
}

// ============================================================================
// Unit tests (no backend required)
// ============================================================================

mod config_tests {
    use super::*;

    #[test]
    fn test_rest_config_default() {
        let config = RestConfig::default();
        assert_eq!(config.base_url, "http://localhost:54321");
        assert!(config.access_token.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_rest_config_urls() {
        let config = RestConfig::new("https://abc.supabase.co/", "key");
        assert_eq!(config.base_url, "https://abc.supabase.co");
        assert_eq!(
            config.table_url("business_profiles"),
            "https://abc.supabase.co/rest/v1/business_profiles"
        );
        assert_eq!(config.check_url(), "https://abc.supabase.co/rest/v1/");
    }

    #[test]
    fn test_bearer_prefers_access_token() {
        let config = RestConfig::new("http://localhost:54321", "anon");
        assert_eq!(config.bearer(), "anon");

        let config = config.with_access_token("jwt");
        assert_eq!(config.bearer(), "jwt");
    }

    #[test]
    fn test_debug_hides_keys() {
        let config = RestConfig::new("http://localhost:54321", "secret-key").with_access_token("jwt");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-key"));
        assert!(!debug.contains("jwt"));
    }
}

// ============================================================================
// Backend tests
// ============================================================================

#[tokio::test]
#[ignore = "requires a running PostgREST backend"]
async fn test_backend_health() {
    let config = live_config().expect("SUPABASE_URL and SUPABASE_ANON_KEY must be set");
    let store = RestStore::connect(config).await.unwrap();
    assert!(store.health_check().await.unwrap());
}

#[tokio::test]
#[ignore = "requires a running PostgREST backend"]
async fn test_backend_profile_and_document_flow() {
    let config = live_config().expect("SUPABASE_URL and SUPABASE_ANON_KEY must be set");
    let store = RestStore::connect(config).await.unwrap();
    let user_id = env::var("DASHBOARD_USER_ID").unwrap_or_else(|_| "integration-test".into());

    let first = store
        .upsert_business_field(&user_id, BusinessField::CompanyName, "Integration Co")
        .await
        .unwrap();
    let second = store
        .upsert_business_field(&user_id, BusinessField::CompanyName, "Integration Co")
        .await
        .unwrap();
    assert_eq!(first.id, second.id);

    let doc = store.insert_document(&first.id, "faq.pdf").await.unwrap();
    store.update_document_progress(&doc.id, 100).await.unwrap();
    store.update_document_progress(&doc.id, 40).await.unwrap();
    store
        .update_document_status(&doc.id, DocumentStatus::Ready)
        .await
        .unwrap();

    let latest = store.latest_document(&first.id).await.unwrap().unwrap();
    assert_eq!(latest.id, doc.id);
    assert_eq!(latest.upload_progress, 100);
    assert_eq!(latest.status, DocumentStatus::Ready);
}

#[tokio::test]
async fn test_connect_to_unreachable_backend_fails() {
    let config = RestConfig::new("http://127.0.0.1:9", "key").with_timeout(Duration::from_secs(2));
    assert!(RestStore::connect(config).await.is_err());
}
