//! Business profile storage.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::fields::BusinessField;
use crate::models::BusinessProfileRecord;
use crate::{Result, StoreError};

const COLUMNS: &str = "id, user_id, company_name, business_category, support_phone, \
                       business_email, operating_hours_start, operating_hours_end";

/// Get the profile owned by a user.
pub async fn get_profile(pool: &SqlitePool, user_id: &str) -> Result<Option<BusinessProfileRecord>> {
    let query = format!(
        "SELECT {COLUMNS} FROM business_profiles WHERE user_id = ?"
    );

    let record = sqlx::query_as::<_, BusinessProfileRecord>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// Get the profile owned by a user, creating an empty one if missing.
pub async fn ensure_profile(pool: &SqlitePool, user_id: &str) -> Result<BusinessProfileRecord> {
    sqlx::query(
        r#"
        INSERT INTO business_profiles (id, user_id)
        VALUES (?, ?)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .execute(pool)
    .await?;

    get_profile(pool, user_id)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            entity: "BusinessProfile",
            id: user_id.to_string(),
        })
}

/// Update a single field in a user's profile.
///
/// Creates the profile if it doesn't exist.
pub async fn upsert_profile_field(
    pool: &SqlitePool,
    user_id: &str,
    field: BusinessField,
    value: &str,
) -> Result<BusinessProfileRecord> {
    // SQLite doesn't support parameterized column names; the column comes
    // from the BusinessField enum, never from user input.
    let column = field.column_name();
    let query = format!(
        r#"
        INSERT INTO business_profiles (id, user_id, {column})
        VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            {column} = excluded.{column},
            updated_at = datetime('now')
        RETURNING {COLUMNS}
        "#,
    );

    let record = sqlx::query_as::<_, BusinessProfileRecord>(&query)
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(value)
        .fetch_one(pool)
        .await?;

    tracing::debug!(user_id, column, "Business profile field updated");
    Ok(record)
}

/// Count profiles owned by a user. Used to check the one-profile invariant.
pub async fn count_profiles(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM business_profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_db;

    #[tokio::test]
    async fn test_get_profile_not_found() {
        let db = test_db().await;
        let profile = get_profile(db.pool(), "user-1").await.unwrap();
        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn test_upsert_creates_profile_with_defaults() {
        let db = test_db().await;

        let record = upsert_profile_field(
            db.pool(),
            "user-1",
            BusinessField::CompanyName,
            "ABC Insurance",
        )
        .await
        .unwrap();

        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.profile.company_name, "ABC Insurance");
        assert_eq!(record.profile.business_category, "");
        assert_eq!(record.profile.operating_hours_start, "09:00");
        assert_eq!(record.profile.operating_hours_end, "17:00");
    }

    #[tokio::test]
    async fn test_update_multiple_fields() {
        let db = test_db().await;
        let pool = db.pool();

        upsert_profile_field(pool, "user-1", BusinessField::CompanyName, "ABC")
            .await
            .unwrap();
        upsert_profile_field(pool, "user-1", BusinessField::BusinessCategory, "Insurance")
            .await
            .unwrap();
        upsert_profile_field(pool, "user-1", BusinessField::OperatingHoursEnd, "18:30")
            .await
            .unwrap();

        let profile = get_profile(pool, "user-1").await.unwrap().unwrap();
        assert_eq!(profile.profile.company_name, "ABC");
        assert_eq!(profile.profile.business_category, "Insurance");
        assert_eq!(profile.profile.operating_hours_end, "18:30");
    }

    #[tokio::test]
    async fn test_repeated_edits_keep_one_row() {
        let db = test_db().await;
        let pool = db.pool();

        let first = upsert_profile_field(pool, "user-1", BusinessField::SupportPhone, "+1 555")
            .await
            .unwrap();
        let second = upsert_profile_field(pool, "user-1", BusinessField::SupportPhone, "+1 555")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(count_profiles(pool, "user-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ensure_profile_is_idempotent() {
        let db = test_db().await;
        let pool = db.pool();

        let created = ensure_profile(pool, "user-1").await.unwrap();
        let again = ensure_profile(pool, "user-1").await.unwrap();

        assert_eq!(created.id, again.id);
        assert_eq!(count_profiles(pool, "user-1").await.unwrap(), 1);
    }
}
