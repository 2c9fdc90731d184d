//! `progression_events` row model.

use questline_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `progression_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProgressionEventRow {
    pub id: DbId,
    pub user_id: DbId,
    pub event_type: String,
    pub source_entity_type: Option<String>,
    pub source_entity_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}
