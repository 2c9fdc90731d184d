//! Repository for the `user_progress` table.

use questline_core::progress::UserProgressState;
use questline_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::progress::{id_array, UserProgressRow};

/// Column list for `user_progress` queries.
const COLUMNS: &str = "user_id, total_xp, level, xp_in_level, streak, longest_streak, \
    last_activity_at, unlocked_achievement_ids, completed_quest_ids, subject_progress, \
    quizzes_passed, friends_added, custom_counters, version, updated_at";

/// Provides versioned reads and writes of a user's progression state.
pub struct ProgressRepo;

impl ProgressRepo {
    /// Load a user's progress row.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<UserProgressRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_progress WHERE user_id = $1");
        sqlx::query_as::<_, UserProgressRow>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Write `state` only if the stored version still equals `state.version`.
    ///
    /// Returns the new version, or `None` when another writer got there first.
    pub async fn update_if_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        state: &UserProgressState,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE user_progress SET \
                total_xp = $3, level = $4, xp_in_level = $5, streak = $6, \
                longest_streak = $7, last_activity_at = $8, \
                unlocked_achievement_ids = $9, completed_quest_ids = $10, \
                subject_progress = $11, quizzes_passed = $12, friends_added = $13, \
                custom_counters = $14, version = version + 1, updated_at = NOW() \
             WHERE user_id = $1 AND version = $2 \
             RETURNING version",
        )
        .bind(state.user_id)
        .bind(state.version)
        .bind(state.total_xp)
        .bind(state.level)
        .bind(state.xp_in_level)
        .bind(state.streak)
        .bind(state.longest_streak)
        .bind(state.last_activity_at)
        .bind(id_array(&state.unlocked_achievement_ids))
        .bind(id_array(&state.completed_quest_ids))
        .bind(Json(&state.subject_progress))
        .bind(state.quizzes_passed)
        .bind(state.friends_added)
        .bind(Json(&state.custom_counters))
        .fetch_optional(&mut **tx)
        .await
    }
}
