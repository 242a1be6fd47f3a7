//! The storage seam shared by the SQLite, REST and in-memory backends.

use async_trait::async_trait;
use serde::Serialize;

use crate::fields::{AgentField, BusinessField};
use crate::models::{
    ActivationRecord, ActivationStatus, AgentConfig, AgentConfigRecord, BusinessProfile,
    BusinessProfileRecord, DocumentStatus, KnowledgeDocument,
};
use crate::Result;

/// Table names used by every backend.
pub mod tables {
    pub const BUSINESS_PROFILES: &str = "business_profiles";
    pub const AGENT_CONFIGS: &str = "ai_agent_configs";
    pub const ACTIVATIONS: &str = "payment_status";
    pub const DOCUMENTS: &str = "knowledge_documents";
}

/// Record storage for the dashboard.
///
/// Field updates are single-column upserts keyed by the owning column, so two
/// edits racing on different fields never overwrite each other.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Look up the profile owned by a user.
    async fn find_business_profile(&self, user_id: &str) -> Result<Option<BusinessProfileRecord>>;

    /// Return the user's profile, creating an empty one if none exists.
    async fn ensure_business_profile(&self, user_id: &str) -> Result<BusinessProfileRecord>;

    /// Set one profile column, creating the profile if needed.
    async fn upsert_business_field(
        &self,
        user_id: &str,
        field: BusinessField,
        value: &str,
    ) -> Result<BusinessProfileRecord>;

    /// Look up the agent config of a business.
    async fn find_agent_config(&self, business_id: &str) -> Result<Option<AgentConfigRecord>>;

    /// Set one agent config column, creating the config with defaults if needed.
    ///
    /// `value` must be normalised with [`AgentField::normalize`].
    async fn upsert_agent_field(
        &self,
        business_id: &str,
        field: AgentField,
        value: &str,
    ) -> Result<AgentConfigRecord>;

    /// Look up the activation row of a business.
    async fn find_activation(&self, business_id: &str) -> Result<Option<ActivationRecord>>;

    /// Record a successful activation. Fails with `AlreadyExists` on a second call.
    async fn insert_activation(
        &self,
        business_id: &str,
        status: &ActivationStatus,
    ) -> Result<ActivationRecord>;

    /// Create a document in `processing` state with zero progress.
    async fn insert_document(&self, business_id: &str, file_name: &str)
        -> Result<KnowledgeDocument>;

    /// Raise a document's progress. Never lowers a stored value.
    async fn update_document_progress(&self, document_id: &str, progress: u8) -> Result<()>;

    /// Move a document to a new stage.
    async fn update_document_status(&self, document_id: &str, status: DocumentStatus)
        -> Result<()>;

    /// Most recently created document of a business.
    async fn latest_document(&self, business_id: &str) -> Result<Option<KnowledgeDocument>>;
}

/// Everything the dashboard shows for one user, as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    /// Profile row id, if the user has edited anything yet.
    pub business_id: Option<String>,
    pub business: BusinessProfile,
    pub agent: AgentConfig,
    /// Present only when an active activation row exists.
    pub activation: Option<ActivationStatus>,
    pub document: Option<KnowledgeDocument>,
}

/// Load a user's dashboard, filling defaults for anything not yet stored.
pub async fn load_snapshot(store: &dyn ProfileStore, user_id: &str) -> Result<DashboardSnapshot> {
    let Some(profile) = store.find_business_profile(user_id).await? else {
        tracing::debug!(user_id, "No business profile yet");
        return Ok(DashboardSnapshot::default());
    };

    let agent = store
        .find_agent_config(&profile.id)
        .await?
        .map(|record| record.config)
        .unwrap_or_default();

    let activation = store
        .find_activation(&profile.id)
        .await?
        .map(|record| record.status)
        .filter(|status| status.is_active);

    let document = store.latest_document(&profile.id).await?;

    Ok(DashboardSnapshot {
        business_id: Some(profile.id),
        business: profile.profile,
        agent,
        activation,
        document,
    })
}
