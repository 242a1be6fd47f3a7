//! [`ProfileStore`] backed by the local SQLite database.

use async_trait::async_trait;

use crate::fields::{AgentField, BusinessField};
use crate::models::{
    ActivationRecord, ActivationStatus, AgentConfigRecord, BusinessProfileRecord, DocumentStatus,
    KnowledgeDocument,
};
use crate::store::ProfileStore;
use crate::{activation, agent_config, business, document, Database, Result};

#[async_trait]
impl ProfileStore for Database {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn find_business_profile(&self, user_id: &str) -> Result<Option<BusinessProfileRecord>> {
        business::get_profile(self.pool(), user_id).await
    }

    async fn ensure_business_profile(&self, user_id: &str) -> Result<BusinessProfileRecord> {
        business::ensure_profile(self.pool(), user_id).await
    }

    async fn upsert_business_field(
        &self,
        user_id: &str,
        field: BusinessField,
        value: &str,
    ) -> Result<BusinessProfileRecord> {
        business::upsert_profile_field(self.pool(), user_id, field, value).await
    }

    async fn find_agent_config(&self, business_id: &str) -> Result<Option<AgentConfigRecord>> {
        agent_config::get_config(self.pool(), business_id).await
    }

    async fn upsert_agent_field(
        &self,
        business_id: &str,
        field: AgentField,
        value: &str,
    ) -> Result<AgentConfigRecord> {
        agent_config::upsert_config_field(self.pool(), business_id, field, value).await
    }

    async fn find_activation(&self, business_id: &str) -> Result<Option<ActivationRecord>> {
        activation::get_activation(self.pool(), business_id).await
    }

    async fn insert_activation(
        &self,
        business_id: &str,
        status: &ActivationStatus,
    ) -> Result<ActivationRecord> {
        activation::insert_activation(self.pool(), business_id, status).await
    }

    async fn insert_document(
        &self,
        business_id: &str,
        file_name: &str,
    ) -> Result<KnowledgeDocument> {
        document::insert_document(self.pool(), business_id, file_name).await
    }

    async fn update_document_progress(&self, document_id: &str, progress: u8) -> Result<()> {
        document::update_progress(self.pool(), document_id, progress).await
    }

    async fn update_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
    ) -> Result<()> {
        document::update_status(self.pool(), document_id, status).await
    }

    async fn latest_document(&self, business_id: &str) -> Result<Option<KnowledgeDocument>> {
        document::latest_document(self.pool(), business_id).await
    }
}
