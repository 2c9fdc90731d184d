//! Repository for the `achievements` catalog table.

use questline_core::achievement::AchievementDefinition;
use questline_core::types::DbId;
use sqlx::PgPool;

use crate::models::achievement::AchievementRow;

/// Column list for `achievements` queries.
const COLUMNS: &str = "id, title, category, rarity, tier, xp_reward, criteria_type, \
    criteria_target, criteria_subject, prerequisite_achievement_id, secret, is_active, \
    sort_order, created_at, updated_at";

/// Provides catalog access for achievement definitions.
pub struct AchievementRepo;

impl AchievementRepo {
    /// Insert a definition. The `id` on `def` is ignored; the generated id is returned.
    pub async fn create(
        pool: &PgPool,
        def: &AchievementDefinition,
        sort_order: i32,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO achievements \
                (title, category, rarity, tier, xp_reward, criteria_type, criteria_target, \
                 criteria_subject, prerequisite_achievement_id, secret, is_active, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING id",
        )
        .bind(&def.title)
        .bind(def.category.as_str())
        .bind(def.rarity.as_str())
        .bind(def.tier.as_str())
        .bind(def.xp_reward)
        .bind(&def.criteria.criteria_type)
        .bind(def.criteria.target)
        .bind(&def.criteria.subject)
        .bind(def.prerequisite_achievement_id)
        .bind(def.secret)
        .bind(def.is_active)
        .bind(sort_order)
        .fetch_one(pool)
        .await
    }

    /// Find a definition by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AchievementRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM achievements WHERE id = $1");
        sqlx::query_as::<_, AchievementRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All active definitions in catalog order.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<AchievementRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM achievements \
             WHERE is_active \
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, AchievementRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Retire a definition. Users who already unlocked it keep it.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE achievements SET is_active = false, updated_at = NOW() \
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
