//! [`ProfileStore`] over the PostgREST tables.

use async_trait::async_trait;
use profile_store::tables::{ACTIVATIONS, AGENT_CONFIGS, BUSINESS_PROFILES, DOCUMENTS};
use profile_store::{
    ActivationRecord, ActivationStatus, AgentConfigRecord, AgentField, BusinessField,
    BusinessProfileRecord, DocumentStatus, KnowledgeDocument, ProfileStore, Result, StoreError,
};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::client::{eq, in_list, lte, RestStore};

/// Body for a single-column upsert keyed by `key_column`.
fn field_body(key_column: &str, key: &str, column: &str, value: &str) -> Value {
    let mut body = Map::new();
    body.insert(key_column.to_string(), Value::from(key));
    body.insert(column.to_string(), Value::from(value));
    body.insert(
        "updated_at".to_string(),
        Value::from(chrono::Utc::now().to_rfc3339()),
    );
    Value::Object(body)
}

impl RestStore {
    /// Distinguish a filtered-out update from a missing row.
    async fn require_document(&self, document_id: &str) -> Result<()> {
        let row: Option<Value> = self.select_one(DOCUMENTS, &[("id", eq(document_id))]).await?;
        match row {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                entity: "KnowledgeDocument",
                id: document_id.to_string(),
            }),
        }
    }
}

#[async_trait]
impl ProfileStore for RestStore {
    fn name(&self) -> &str {
        "rest"
    }

    async fn find_business_profile(&self, user_id: &str) -> Result<Option<BusinessProfileRecord>> {
        Ok(self
            .select_one(BUSINESS_PROFILES, &[("user_id", eq(user_id))])
            .await?)
    }

    async fn ensure_business_profile(&self, user_id: &str) -> Result<BusinessProfileRecord> {
        if let Some(existing) = self.find_business_profile(user_id).await? {
            return Ok(existing);
        }

        match self
            .insert::<_, BusinessProfileRecord>(BUSINESS_PROFILES, &json!({ "user_id": user_id }))
            .await
        {
            Ok(created) => {
                info!(user_id, "Business profile created");
                Ok(created)
            }
            // Another request created it between our lookup and insert.
            Err(err) if err.is_conflict() => self
                .find_business_profile(user_id)
                .await?
                .ok_or_else(|| StoreError::NotFound {
                    entity: "BusinessProfile",
                    id: user_id.to_string(),
                }),
            Err(err) => Err(err.into()),
        }
    }

    async fn upsert_business_field(
        &self,
        user_id: &str,
        field: BusinessField,
        value: &str,
    ) -> Result<BusinessProfileRecord> {
        let body = field_body("user_id", user_id, field.column_name(), value);
        let record = self.upsert(BUSINESS_PROFILES, "user_id", &body).await?;
        debug!(user_id, column = field.column_name(), "Business profile field upserted");
        Ok(record)
    }

    async fn find_agent_config(&self, business_id: &str) -> Result<Option<AgentConfigRecord>> {
        Ok(self
            .select_one(AGENT_CONFIGS, &[("business_id", eq(business_id))])
            .await?)
    }

    async fn upsert_agent_field(
        &self,
        business_id: &str,
        field: AgentField,
        value: &str,
    ) -> Result<AgentConfigRecord> {
        let body = field_body("business_id", business_id, field.column_name(), value);
        let record = self.upsert(AGENT_CONFIGS, "business_id", &body).await?;
        debug!(business_id, column = field.column_name(), "Agent config field upserted");
        Ok(record)
    }

    async fn find_activation(&self, business_id: &str) -> Result<Option<ActivationRecord>> {
        Ok(self
            .select_one(ACTIVATIONS, &[("business_id", eq(business_id))])
            .await?)
    }

    async fn insert_activation(
        &self,
        business_id: &str,
        status: &ActivationStatus,
    ) -> Result<ActivationRecord> {
        let body = json!({
            "business_id": business_id,
            "is_active": status.is_active,
            "phone_number": status.phone_number,
            "activated_at": status.activated_at,
        });

        match self.insert(ACTIVATIONS, &body).await {
            Ok(record) => Ok(record),
            Err(err) if err.is_conflict() => Err(StoreError::AlreadyExists {
                entity: "ActivationStatus",
                id: business_id.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    async fn insert_document(
        &self,
        business_id: &str,
        file_name: &str,
    ) -> Result<KnowledgeDocument> {
        let body = json!({
            "business_id": business_id,
            "file_name": file_name,
            "status": DocumentStatus::Processing,
            "upload_progress": 0,
        });
        Ok(self.insert(DOCUMENTS, &body).await?)
    }

    async fn update_document_progress(&self, document_id: &str, progress: u8) -> Result<()> {
        let progress = progress.min(100);
        // The lte filter keeps a late or repeated write from lowering progress.
        let updated = self
            .update(
                DOCUMENTS,
                &[("id", eq(document_id)), ("upload_progress", lte(progress))],
                &json!({ "upload_progress": progress }),
            )
            .await?;

        if updated == 0 {
            self.require_document(document_id).await?;
        }
        Ok(())
    }

    async fn update_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
    ) -> Result<()> {
        let updated = self
            .update(
                DOCUMENTS,
                &[
                    ("id", eq(document_id)),
                    ("status", in_list(status.replaceable())),
                ],
                &json!({ "status": status }),
            )
            .await?;

        if updated == 0 {
            self.require_document(document_id).await?;
            debug!(document_id, %status, "Stale status ignored");
        }
        Ok(())
    }

    async fn latest_document(&self, business_id: &str) -> Result<Option<KnowledgeDocument>> {
        Ok(self
            .select_latest(DOCUMENTS, &[("business_id", eq(business_id))], "created_at")
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_body_has_key_and_column() {
        let body = field_body("user_id", "user-1", "company_name", "ABC");
        assert_eq!(body["user_id"], "user-1");
        assert_eq!(body["company_name"], "ABC");
        assert!(body["updated_at"].is_string());
    }

    #[test]
    fn test_rows_decode_with_nulls_and_extra_columns() {
        let row = json!({
            "id": "9b1d",
            "user_id": "user-1",
            "company_name": null,
            "business_category": "Insurance",
            "operating_hours_start": null,
            "created_at": "2026-01-01T00:00:00+00:00"
        });

        let record: BusinessProfileRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.profile.company_name, "");
        assert_eq!(record.profile.business_category, "Insurance");
        assert_eq!(record.profile.operating_hours_start, "09:00");
        assert_eq!(record.profile.operating_hours_end, "17:00");
    }

    #[test]
    fn test_document_row_decodes() {
        let row = json!({
            "id": "d1",
            "business_id": "b1",
            "file_name": "faq.pdf",
            "status": "indexed",
            "upload_progress": 100,
            "created_at": "2026-01-01T00:00:00+00:00"
        });

        let doc: KnowledgeDocument = serde_json::from_value(row).unwrap();
        assert_eq!(doc.status, DocumentStatus::Indexed);
        assert_eq!(doc.upload_progress, 100);
    }

    #[test]
    fn test_status_filter_lists_earlier_stages() {
        assert_eq!(
            in_list(DocumentStatus::Indexed.replaceable()),
            "in.(processing,indexed)"
        );
        assert_eq!(
            in_list(DocumentStatus::Processing.replaceable()),
            "in.(processing)"
        );
    }

    /// A PostgREST stand-in whose PATCH never matches and whose GET
    /// returns the stored rows.
    async fn stub_backend(rows: Value) -> RestStore {
        use axum::routing::get;
        use axum::{Json, Router};

        let table = format!("/rest/v1/{DOCUMENTS}");
        let app = Router::new().route(
            &table,
            get(move || {
                let rows = rows.clone();
                async move { Json(rows) }
            })
            .patch(|| async { Json(json!([])) }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        RestStore::new(crate::RestConfig::new(format!("http://{addr}"), "anon")).unwrap()
    }

    #[tokio::test]
    async fn test_unmatched_document_update_reports_missing_row() {
        let store = stub_backend(json!([])).await;

        let progress = store.update_document_progress("gone", 40).await;
        assert!(matches!(progress, Err(StoreError::NotFound { .. })));

        let status = store
            .update_document_status("gone", DocumentStatus::Ready)
            .await;
        assert!(matches!(status, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_filtered_out_update_on_existing_row_is_ok() {
        let row = json!([{
            "id": "d1",
            "business_id": "b1",
            "file_name": "faq.pdf",
            "status": "ready",
            "upload_progress": 100
        }]);
        let store = stub_backend(row).await;

        store.update_document_progress("d1", 40).await.unwrap();
        store
            .update_document_status("d1", DocumentStatus::Indexed)
            .await
            .unwrap();
    }
}
