//! Agent configuration storage.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::fields::AgentField;
use crate::models::AgentConfigRecord;
use crate::Result;

const COLUMNS: &str =
    "id, business_id, greeting_message, response_tone, language, max_response_length";

/// Get the agent config of a business.
pub async fn get_config(pool: &SqlitePool, business_id: &str) -> Result<Option<AgentConfigRecord>> {
    let query = format!("SELECT {COLUMNS} FROM ai_agent_configs WHERE business_id = ?");

    let record = sqlx::query_as::<_, AgentConfigRecord>(&query)
        .bind(business_id)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// Update a single agent config field, creating the config with defaults if needed.
pub async fn upsert_config_field(
    pool: &SqlitePool,
    business_id: &str,
    field: AgentField,
    value: &str,
) -> Result<AgentConfigRecord> {
    let column = field.column_name();
    let query = format!(
        r#"
        INSERT INTO ai_agent_configs (id, business_id, {column})
        VALUES (?, ?, ?)
        ON CONFLICT(business_id) DO UPDATE SET
            {column} = excluded.{column},
            updated_at = datetime('now')
        RETURNING {COLUMNS}
        "#,
    );

    let record = sqlx::query_as::<_, AgentConfigRecord>(&query)
        .bind(Uuid::new_v4().to_string())
        .bind(business_id)
        .bind(value)
        .fetch_one(pool)
        .await?;

    tracing::debug!(business_id, column, "Agent config field updated");
    Ok(record)
}
