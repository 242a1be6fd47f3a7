//! Activation status storage.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{ActivationRecord, ActivationStatus};
use crate::{Result, StoreError};

/// Get the activation row of a business.
pub async fn get_activation(
    pool: &SqlitePool,
    business_id: &str,
) -> Result<Option<ActivationRecord>> {
    let record = sqlx::query_as::<_, ActivationRecord>(
        r#"
        SELECT id, business_id, is_active, phone_number, activated_at
        FROM payment_status
        WHERE business_id = ?
        "#,
    )
    .bind(business_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Record a business's activation. Each business activates at most once.
pub async fn insert_activation(
    pool: &SqlitePool,
    business_id: &str,
    status: &ActivationStatus,
) -> Result<ActivationRecord> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO payment_status (id, business_id, is_active, phone_number, activated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(business_id)
    .bind(status.is_active)
    .bind(&status.phone_number)
    .bind(&status.activated_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return StoreError::AlreadyExists {
                    entity: "ActivationStatus",
                    id: business_id.to_string(),
                };
            }
        }
        StoreError::Sqlx(e)
    })?;

    tracing::info!(business_id, phone_number = %status.phone_number, "Activation recorded");

    Ok(ActivationRecord {
        id,
        business_id: business_id.to_string(),
        status: status.clone(),
    })
}
