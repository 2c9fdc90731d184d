//! Repository for the `progression_events` audit table.

use questline_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::ProgressionEventRow;

/// Column list for `progression_events` queries.
const COLUMNS: &str =
    "id, user_id, event_type, source_entity_type, source_entity_id, payload, created_at";

/// Provides append and read access to the progression event log.
pub struct ProgressionEventRepo;

impl ProgressionEventRepo {
    /// Append an event, returning its id.
    pub async fn insert(
        pool: &PgPool,
        user_id: DbId,
        event_type: &str,
        source_entity_type: Option<&str>,
        source_entity_id: Option<DbId>,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO progression_events \
                (user_id, event_type, source_entity_type, source_entity_id, payload) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(event_type)
        .bind(source_entity_type)
        .bind(source_entity_id)
        .bind(payload)
        .fetch_one(pool)
        .await
    }

    /// Most recent events for a user, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<ProgressionEventRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM progression_events \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, ProgressionEventRow>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
