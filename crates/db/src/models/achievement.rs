//! `achievements` row model.

use questline_core::achievement::{AchievementCategory, AchievementDefinition, Rarity, Tier};
use questline_core::error::CoreError;
use questline_core::objective::Criteria;
use questline_core::types::{DbId, Timestamp, Xp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `achievements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AchievementRow {
    pub id: DbId,
    pub title: String,
    pub category: String,
    pub rarity: String,
    pub tier: String,
    pub xp_reward: Xp,
    pub criteria_type: String,
    pub criteria_target: i64,
    pub criteria_subject: Option<String>,
    pub prerequisite_achievement_id: Option<DbId>,
    pub secret: bool,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<AchievementRow> for AchievementDefinition {
    type Error = CoreError;

    fn try_from(row: AchievementRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            category: AchievementCategory::from_str_value(&row.category)?,
            rarity: Rarity::from_str_value(&row.rarity)?,
            tier: Tier::from_str_value(&row.tier)?,
            xp_reward: row.xp_reward,
            criteria: Criteria {
                criteria_type: row.criteria_type,
                target: row.criteria_target,
                subject: row.criteria_subject,
            },
            prerequisite_achievement_id: row.prerequisite_achievement_id,
            secret: row.secret,
            is_active: row.is_active,
        })
    }
}
