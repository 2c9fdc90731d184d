//! `user_progress` row model.

use std::collections::{BTreeMap, BTreeSet};

use questline_core::progress::{SubjectProgress, UserProgressState};
use questline_core::types::{DbId, SubjectId, Timestamp, Xp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `user_progress` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserProgressRow {
    pub user_id: DbId,
    pub total_xp: Xp,
    pub level: i32,
    pub xp_in_level: Xp,
    pub streak: i32,
    pub longest_streak: i32,
    pub last_activity_at: Timestamp,
    pub unlocked_achievement_ids: Vec<DbId>,
    pub completed_quest_ids: Vec<DbId>,
    pub subject_progress: Json<BTreeMap<SubjectId, SubjectProgress>>,
    pub quizzes_passed: i64,
    pub friends_added: i64,
    pub custom_counters: Json<BTreeMap<String, i64>>,
    pub version: i64,
    pub updated_at: Timestamp,
}

impl From<UserProgressRow> for UserProgressState {
    fn from(row: UserProgressRow) -> Self {
        Self {
            user_id: row.user_id,
            total_xp: row.total_xp,
            level: row.level,
            xp_in_level: row.xp_in_level,
            streak: row.streak,
            longest_streak: row.longest_streak,
            last_activity_at: row.last_activity_at,
            unlocked_achievement_ids: row.unlocked_achievement_ids.into_iter().collect(),
            completed_quest_ids: row.completed_quest_ids.into_iter().collect(),
            subject_progress: row.subject_progress.0,
            quizzes_passed: row.quizzes_passed,
            friends_added: row.friends_added,
            custom_counters: row.custom_counters.0,
            version: row.version,
        }
    }
}

/// Flatten an id set into the `BIGINT[]` bind form.
pub fn id_array(ids: &BTreeSet<DbId>) -> Vec<DbId> {
    ids.iter().copied().collect()
}
