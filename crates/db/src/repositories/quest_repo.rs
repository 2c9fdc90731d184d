//! Repository for the `quests` catalog and per-user `user_quests` instances.

use questline_core::quest::QuestDefinition;
use questline_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::quest::QuestRow;

/// Select list for a quest overlaid with the instance of user `$1`.
const INSTANCE_SELECT: &str = "SELECT q.id, q.title, q.quest_type, q.difficulty, \
        COALESCE(uq.objectives, q.objectives) AS objectives, \
        q.reward_xp, q.reward_achievement_ids, q.bonus_multiplier, q.min_level, \
        q.required_quest_ids, q.required_achievement_ids, q.starts_at, q.ends_at, \
        q.max_participants, q.whitelist, \
        ARRAY(SELECT p.user_id FROM user_quests p WHERE p.quest_id = q.id ORDER BY p.user_id) \
            AS participant_ids, \
        COALESCE(uq.progress, 0::SMALLINT) AS progress, \
        COALESCE(uq.completed, false) AS completed \
    FROM quests q \
    LEFT JOIN user_quests uq ON uq.quest_id = q.id AND uq.user_id = $1";

/// Provides catalog writes and per-user instance reads/writes for quests.
pub struct QuestRepo;

impl QuestRepo {
    /// Insert a quest definition, returning the generated id.
    pub async fn create(pool: &PgPool, quest: &QuestDefinition) -> Result<DbId, sqlx::Error> {
        let window = quest.time_window.unwrap_or_default();
        let max = quest.participants.max.map(|m| m as i32);

        sqlx::query_scalar(
            "INSERT INTO quests \
                (title, quest_type, objectives, reward_xp, reward_achievement_ids, \
                 bonus_multiplier, min_level, required_quest_ids, required_achievement_ids, \
                 starts_at, ends_at, max_participants, whitelist, difficulty) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING id",
        )
        .bind(&quest.title)
        .bind(quest.quest_type.as_str())
        .bind(Json(&quest.objectives))
        .bind(quest.rewards.xp)
        .bind(&quest.rewards.achievement_ids)
        .bind(quest.rewards.bonus_multiplier)
        .bind(quest.prerequisites.min_level)
        .bind(&quest.prerequisites.required_quest_ids)
        .bind(&quest.prerequisites.required_achievement_ids)
        .bind(window.start)
        .bind(window.end)
        .bind(max)
        .bind(&quest.participants.whitelist)
        .bind(quest.difficulty.as_str())
        .fetch_one(pool)
        .await
    }

    /// Active quests as seen by `user_id`, with that user's instance progress.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<QuestRow>, sqlx::Error> {
        let query = format!("{INSTANCE_SELECT} WHERE q.is_active ORDER BY q.id");
        sqlx::query_as::<_, QuestRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Reserve a participant slot on `quest_id` for `user_id`.
    ///
    /// Users who already hold an instance always succeed. Otherwise the quest
    /// row is locked so concurrent joiners serialize, and `false` is returned
    /// when the participant cap is already reached.
    pub async fn claim_slot(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        quest_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let member: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_quests WHERE quest_id = $1 AND user_id = $2)",
        )
        .bind(quest_id)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;
        if member {
            return Ok(true);
        }

        let max: Option<Option<i32>> =
            sqlx::query_scalar("SELECT max_participants FROM quests WHERE id = $1 FOR UPDATE")
                .bind(quest_id)
                .fetch_optional(&mut **tx)
                .await?;
        let Some(Some(max)) = max else {
            return Ok(true);
        };

        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_quests WHERE quest_id = $1")
            .bind(quest_id)
            .fetch_one(&mut **tx)
            .await?;
        Ok(taken < i64::from(max))
    }

    /// Upsert the user's instance of a quest within an open transaction.
    pub async fn upsert_instance(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: DbId,
        quest: &QuestDefinition,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_quests (user_id, quest_id, objectives, progress, completed, completed_at) \
             VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 THEN NOW() END) \
             ON CONFLICT (user_id, quest_id) DO UPDATE SET \
                objectives = EXCLUDED.objectives, \
                progress = EXCLUDED.progress, \
                completed = EXCLUDED.completed, \
                completed_at = COALESCE(user_quests.completed_at, EXCLUDED.completed_at), \
                updated_at = NOW()",
        )
        .bind(user_id)
        .bind(quest.id)
        .bind(Json(&quest.objectives))
        .bind(i16::from(quest.progress))
        .bind(quest.completed)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
