//! Quest catalog rows, optionally overlaid with a user's instance progress.

use questline_core::error::CoreError;
use questline_core::quest::{
    Participants, QuestDefinition, QuestDifficulty, QuestObjective, QuestPrerequisites,
    QuestRewards, QuestType, TimeWindow,
};
use questline_core::types::{DbId, Timestamp, Xp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A `quests` row joined with the caller's `user_quests` row (if any).
///
/// `objectives`, `progress` and `completed` come from the instance when the
/// user has joined, otherwise from the catalog defaults.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuestRow {
    pub id: DbId,
    pub title: String,
    pub quest_type: String,
    pub difficulty: String,
    pub objectives: Json<Vec<QuestObjective>>,
    pub reward_xp: Xp,
    pub reward_achievement_ids: Vec<DbId>,
    pub bonus_multiplier: f64,
    pub min_level: i32,
    pub required_quest_ids: Vec<DbId>,
    pub required_achievement_ids: Vec<DbId>,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    pub max_participants: Option<i32>,
    pub whitelist: Vec<DbId>,
    pub participant_ids: Vec<DbId>,
    pub progress: i16,
    pub completed: bool,
}

impl TryFrom<QuestRow> for QuestDefinition {
    type Error = CoreError;

    fn try_from(row: QuestRow) -> Result<Self, Self::Error> {
        let time_window = match (row.starts_at, row.ends_at) {
            (None, None) => None,
            (start, end) => Some(TimeWindow { start, end }),
        };
        let max = row
            .max_participants
            .map(u32::try_from)
            .transpose()
            .map_err(|_| CoreError::Validation(format!("Quest {} has a negative cap", row.id)))?;

        Ok(Self {
            id: row.id,
            title: row.title,
            quest_type: QuestType::from_str_value(&row.quest_type)?,
            difficulty: QuestDifficulty::from_str_value(&row.difficulty)?,
            objectives: row.objectives.0,
            rewards: QuestRewards {
                xp: row.reward_xp,
                achievement_ids: row.reward_achievement_ids,
                bonus_multiplier: row.bonus_multiplier,
            },
            prerequisites: QuestPrerequisites {
                min_level: row.min_level,
                required_quest_ids: row.required_quest_ids,
                required_achievement_ids: row.required_achievement_ids,
            },
            time_window,
            participants: Participants {
                user_ids: row.participant_ids.into_iter().collect(),
                max,
                whitelist: row.whitelist,
            },
            progress: row.progress.clamp(0, 100) as u8,
            completed: row.completed,
        })
    }
}
