//! Knowledge document storage.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{DocumentStatus, KnowledgeDocument};
use crate::{Result, StoreError};

const COLUMNS: &str = "id, business_id, file_name, status, upload_progress, created_at";

/// Create a document in the processing stage.
pub async fn insert_document(
    pool: &SqlitePool,
    business_id: &str,
    file_name: &str,
) -> Result<KnowledgeDocument> {
    let query = format!(
        r#"
        INSERT INTO knowledge_documents (id, business_id, file_name, status, upload_progress)
        VALUES (?, ?, ?, ?, 0)
        RETURNING {COLUMNS}
        "#,
    );

    let document = sqlx::query_as::<_, KnowledgeDocument>(&query)
        .bind(Uuid::new_v4().to_string())
        .bind(business_id)
        .bind(file_name)
        .bind(DocumentStatus::Processing)
        .fetch_one(pool)
        .await?;

    tracing::info!(business_id, document_id = %document.id, file_name, "Document created");
    Ok(document)
}

/// Raise a document's upload progress. A lower value leaves the row unchanged.
pub async fn update_progress(pool: &SqlitePool, document_id: &str, progress: u8) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE knowledge_documents
        SET upload_progress = MAX(upload_progress, ?)
        WHERE id = ?
        "#,
    )
    .bind(progress.min(100))
    .bind(document_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: "KnowledgeDocument",
            id: document_id.to_string(),
        });
    }

    Ok(())
}

/// Move a document forward to `status`. A move to an earlier stage leaves the row unchanged.
pub async fn update_status(
    pool: &SqlitePool,
    document_id: &str,
    status: DocumentStatus,
) -> Result<()> {
    let allowed = status
        .replaceable()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let query = format!(
        r#"
        UPDATE knowledge_documents
        SET status = ?
        WHERE id = ? AND status IN ({allowed})
        "#,
    );

    let result = sqlx::query(&query)
        .bind(status)
        .bind(document_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        let exists = sqlx::query("SELECT 1 FROM knowledge_documents WHERE id = ?")
            .bind(document_id)
            .fetch_optional(pool)
            .await?;
        if exists.is_none() {
            return Err(StoreError::NotFound {
                entity: "KnowledgeDocument",
                id: document_id.to_string(),
            });
        }
        tracing::debug!(document_id, %status, "Stale status ignored");
    }

    Ok(())
}

/// Get the most recently created document of a business.
pub async fn latest_document(
    pool: &SqlitePool,
    business_id: &str,
) -> Result<Option<KnowledgeDocument>> {
    let query = format!(
        r#"
        SELECT {COLUMNS}
        FROM knowledge_documents
        WHERE business_id = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT 1
        "#,
    );

    let document = sqlx::query_as::<_, KnowledgeDocument>(&query)
        .bind(business_id)
        .fetch_optional(pool)
        .await?;

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::ensure_profile;
    use crate::testing::test_db;

    #[tokio::test]
    async fn test_insert_starts_processing() {
        let db = test_db().await;
        let profile = ensure_profile(db.pool(), "user-1").await.unwrap();

        let doc = insert_document(db.pool(), &profile.id, "faq.pdf").await.unwrap();

        assert_eq!(doc.file_name, "faq.pdf");
        assert_eq!(doc.status, DocumentStatus::Processing);
        assert_eq!(doc.upload_progress, 0);
    }

    #[tokio::test]
    async fn test_progress_never_decreases() {
        let db = test_db().await;
        let pool = db.pool();
        let profile = ensure_profile(pool, "user-1").await.unwrap();
        let doc = insert_document(pool, &profile.id, "faq.pdf").await.unwrap();

        update_progress(pool, &doc.id, 60).await.unwrap();
        update_progress(pool, &doc.id, 40).await.unwrap();

        let latest = latest_document(pool, &profile.id).await.unwrap().unwrap();
        assert_eq!(latest.upload_progress, 60);
    }

    #[tokio::test]
    async fn test_status_and_latest() {
        let db = test_db().await;
        let pool = db.pool();
        let profile = ensure_profile(pool, "user-1").await.unwrap();

        let old = insert_document(pool, &profile.id, "old.pdf").await.unwrap();
        update_status(pool, &old.id, DocumentStatus::Ready).await.unwrap();
        let new = insert_document(pool, &profile.id, "new.pdf").await.unwrap();
        update_progress(pool, &new.id, 100).await.unwrap();
        update_status(pool, &new.id, DocumentStatus::Indexed).await.unwrap();

        let latest = latest_document(pool, &profile.id).await.unwrap().unwrap();
        assert_eq!(latest.file_name, "new.pdf");
        assert_eq!(latest.status, DocumentStatus::Indexed);
        assert_eq!(latest.upload_progress, 100);
    }

    #[tokio::test]
    async fn test_status_never_moves_backwards() {
        let db = test_db().await;
        let pool = db.pool();
        let profile = ensure_profile(pool, "user-1").await.unwrap();
        let doc = insert_document(pool, &profile.id, "faq.pdf").await.unwrap();

        update_status(pool, &doc.id, DocumentStatus::Ready).await.unwrap();
        update_status(pool, &doc.id, DocumentStatus::Indexed).await.unwrap();
        update_status(pool, &doc.id, DocumentStatus::Ready).await.unwrap();

        let latest = latest_document(pool, &profile.id).await.unwrap().unwrap();
        assert_eq!(latest.status, DocumentStatus::Ready);
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let db = test_db().await;
        let result = update_progress(db.pool(), "missing", 20).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));

        let result = update_status(db.pool(), "missing", DocumentStatus::Indexed).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
