//! In-process [`ProfileStore`] for tests and offline demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use crate::fields::{AgentField, BusinessField};
use crate::models::{
    ActivationRecord, ActivationStatus, AgentConfig, AgentConfigRecord, BusinessProfile,
    BusinessProfileRecord, DocumentStatus, KnowledgeDocument,
};
use crate::store::ProfileStore;
use crate::{Result, StoreError};

#[derive(Default)]
struct Tables {
    profiles: HashMap<String, BusinessProfileRecord>,
    configs: HashMap<String, AgentConfigRecord>,
    activations: HashMap<String, ActivationRecord>,
    documents: Vec<KnowledgeDocument>,
}

/// A store that keeps every table in memory.
///
/// Writes can be made to fail on demand to exercise retry paths.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn fail_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored business profiles.
    pub fn profile_count(&self) -> usize {
        self.lock().profiles.len()
    }

    /// Number of stored documents across all businesses.
    pub fn document_count(&self) -> usize {
        self.lock().documents.len()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gate a write, failing it when writes are switched off.
    fn begin_write(&self) -> Result<MutexGuard<'_, Tables>> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store rejecting writes".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock())
    }

    fn profile_entry<'a>(tables: &'a mut Tables, user_id: &str) -> &'a mut BusinessProfileRecord {
        tables
            .profiles
            .entry(user_id.to_string())
            .or_insert_with(|| BusinessProfileRecord {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                profile: BusinessProfile::default(),
            })
    }

    fn document_mut<'a>(
        tables: &'a mut Tables,
        document_id: &str,
    ) -> Result<&'a mut KnowledgeDocument> {
        tables
            .documents
            .iter_mut()
            .find(|d| d.id == document_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "KnowledgeDocument",
                id: document_id.to_string(),
            })
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find_business_profile(&self, user_id: &str) -> Result<Option<BusinessProfileRecord>> {
        Ok(self.lock().profiles.get(user_id).cloned())
    }

    async fn ensure_business_profile(&self, user_id: &str) -> Result<BusinessProfileRecord> {
        if let Some(existing) = self.lock().profiles.get(user_id) {
            return Ok(existing.clone());
        }
        let mut tables = self.begin_write()?;
        Ok(Self::profile_entry(&mut tables, user_id).clone())
    }

    async fn upsert_business_field(
        &self,
        user_id: &str,
        field: BusinessField,
        value: &str,
    ) -> Result<BusinessProfileRecord> {
        let mut tables = self.begin_write()?;
        let record = Self::profile_entry(&mut tables, user_id);
        field.apply(&mut record.profile, value);
        Ok(record.clone())
    }

    async fn find_agent_config(&self, business_id: &str) -> Result<Option<AgentConfigRecord>> {
        Ok(self.lock().configs.get(business_id).cloned())
    }

    async fn upsert_agent_field(
        &self,
        business_id: &str,
        field: AgentField,
        value: &str,
    ) -> Result<AgentConfigRecord> {
        let mut tables = self.begin_write()?;
        let record = tables
            .configs
            .entry(business_id.to_string())
            .or_insert_with(|| AgentConfigRecord {
                id: Uuid::new_v4().to_string(),
                business_id: business_id.to_string(),
                config: AgentConfig::default(),
            });
        field.apply(&mut record.config, value)?;
        Ok(record.clone())
    }

    async fn find_activation(&self, business_id: &str) -> Result<Option<ActivationRecord>> {
        Ok(self.lock().activations.get(business_id).cloned())
    }

    async fn insert_activation(
        &self,
        business_id: &str,
        status: &ActivationStatus,
    ) -> Result<ActivationRecord> {
        let mut tables = self.begin_write()?;
        if tables.activations.contains_key(business_id) {
            return Err(StoreError::AlreadyExists {
                entity: "ActivationStatus",
                id: business_id.to_string(),
            });
        }
        let record = ActivationRecord {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            status: status.clone(),
        };
        tables
            .activations
            .insert(business_id.to_string(), record.clone());
        Ok(record)
    }

    async fn insert_document(
        &self,
        business_id: &str,
        file_name: &str,
    ) -> Result<KnowledgeDocument> {
        let mut tables = self.begin_write()?;
        let document = KnowledgeDocument {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            file_name: file_name.to_string(),
            status: DocumentStatus::Processing,
            upload_progress: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        tables.documents.push(document.clone());
        Ok(document)
    }

    async fn update_document_progress(&self, document_id: &str, progress: u8) -> Result<()> {
        let mut tables = self.begin_write()?;
        let document = Self::document_mut(&mut tables, document_id)?;
        document.upload_progress = document.upload_progress.max(progress.min(100));
        Ok(())
    }

    async fn update_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
    ) -> Result<()> {
        let mut tables = self.begin_write()?;
        let document = Self::document_mut(&mut tables, document_id)?;
        document.status = document.status.max(status);
        Ok(())
    }

    async fn latest_document(&self, business_id: &str) -> Result<Option<KnowledgeDocument>> {
        // Insertion order is creation order.
        Ok(self
            .lock()
            .documents
            .iter()
            .rev()
            .find(|d| d.business_id == business_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_field_upserts_share_one_profile() {
        let store = MemoryStore::new();

        store
            .upsert_business_field("user-1", BusinessField::CompanyName, "ABC")
            .await
            .unwrap();
        store
            .upsert_business_field("user-1", BusinessField::CompanyName, "ABC")
            .await
            .unwrap();
        let record = store
            .upsert_business_field("user-1", BusinessField::BusinessEmail, "support@abc.com")
            .await
            .unwrap();

        assert_eq!(store.profile_count(), 1);
        assert_eq!(record.profile.company_name, "ABC");
        assert_eq!(record.profile.business_email, "support@abc.com");
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let store = MemoryStore::new();
        store.fail_writes(true);

        let result = store
            .upsert_business_field("user-1", BusinessField::CompanyName, "ABC")
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(result.unwrap_err().is_transient());
        assert_eq!(store.write_count(), 0);

        store.fail_writes(false);
        store
            .upsert_business_field("user-1", BusinessField::CompanyName, "ABC")
            .await
            .unwrap();
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_latest_document_and_progress() {
        let store = MemoryStore::new();
        let profile = store.ensure_business_profile("user-1").await.unwrap();

        store.insert_document(&profile.id, "a.pdf").await.unwrap();
        let b = store.insert_document(&profile.id, "b.pdf").await.unwrap();
        store.update_document_progress(&b.id, 80).await.unwrap();
        store.update_document_progress(&b.id, 20).await.unwrap();

        let latest = store.latest_document(&profile.id).await.unwrap().unwrap();
        assert_eq!(latest.file_name, "b.pdf");
        assert_eq!(latest.upload_progress, 80);
        assert_eq!(store.document_count(), 2);
    }

    #[tokio::test]
    async fn test_status_only_moves_forward() {
        let store = MemoryStore::new();
        let profile = store.ensure_business_profile("user-1").await.unwrap();
        let doc = store.insert_document(&profile.id, "a.pdf").await.unwrap();

        store
            .update_document_status(&doc.id, DocumentStatus::Ready)
            .await
            .unwrap();
        store
            .update_document_status(&doc.id, DocumentStatus::Indexed)
            .await
            .unwrap();

        let latest = store.latest_document(&profile.id).await.unwrap().unwrap();
        assert_eq!(latest.status, DocumentStatus::Ready);
    }
}
