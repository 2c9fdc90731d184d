//! Achievement catalog types and the unlock engine.
//!
//! Definitions are read-only catalog data authored by content managers. The
//! engine only records unlocked ids on the user; it never embeds definitions.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::events::UnlockEvent;
use crate::objective::{self, Criteria, ObjectiveType};
use crate::progress::{ProgressSnapshot, UserProgressState};
use crate::types::{DbId, Xp};
use crate::xp::apply_xp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MIN_TITLE_LENGTH: usize = 3;
pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_XP_REWARD: Xp = 1_000;
pub const DEFAULT_XP_REWARD: Xp = 50;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Learning,
    Streak,
    Social,
    Completion,
    Mastery,
    Exploration,
    Speed,
    Perfection,
}

impl AchievementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Streak => "streak",
            Self::Social => "social",
            Self::Completion => "completion",
            Self::Mastery => "mastery",
            Self::Exploration => "exploration",
            Self::Speed => "speed",
            Self::Perfection => "perfection",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "learning" => Ok(Self::Learning),
            "streak" => Ok(Self::Streak),
            "social" => Ok(Self::Social),
            "completion" => Ok(Self::Completion),
            "mastery" => Ok(Self::Mastery),
            "exploration" => Ok(Self::Exploration),
            "speed" => Ok(Self::Speed),
            "perfection" => Ok(Self::Perfection),
            _ => Err(CoreError::Validation(format!(
                "Invalid achievement category '{s}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "common" => Ok(Self::Common),
            "uncommon" => Ok(Self::Uncommon),
            "rare" => Ok(Self::Rare),
            "epic" => Ok(Self::Epic),
            "legendary" => Ok(Self::Legendary),
            _ => Err(CoreError::Validation(format!("Invalid rarity '{s}'"))),
        }
    }
}

/// Medal tier shown on the badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
            Self::Diamond => "diamond",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "bronze" => Ok(Self::Bronze),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            "platinum" => Ok(Self::Platinum),
            "diamond" => Ok(Self::Diamond),
            _ => Err(CoreError::Validation(format!("Invalid tier '{s}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDefinition {
    pub id: DbId,
    pub title: String,
    pub category: AchievementCategory,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub tier: Tier,
    pub xp_reward: Xp,
    pub criteria: Criteria,
    #[serde(default)]
    pub prerequisite_achievement_id: Option<DbId>,
    #[serde(default)]
    pub secret: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl AchievementDefinition {
    /// Difficulty bucket (1-5) derived from the criteria target.
    pub fn difficulty_level(&self) -> u8 {
        match self.criteria.target {
            t if t <= 5 => 1,
            t if t <= 15 => 2,
            t if t <= 30 => 3,
            t if t <= 50 => 4,
            _ => 5,
        }
    }

    /// Rough number of days a typical learner needs to earn this.
    pub fn estimated_days_to_complete(&self) -> i64 {
        let target = self.criteria.target.max(1);
        let ceil_div = |n: i64, d: i64| (n + d - 1) / d;
        match ObjectiveType::parse(&self.criteria.criteria_type) {
            Ok(ObjectiveType::LessonsCompleted) => ceil_div(target, 2),
            Ok(ObjectiveType::StreakDays) => target,
            Ok(ObjectiveType::CoursesFinished) => target * 7,
            Ok(ObjectiveType::PerfectScores) => ceil_div(target, 3),
            _ => ceil_div(target, 7),
        }
    }
}

/// Validate an achievement definition before it enters the catalog.
pub fn validate_definition(def: &AchievementDefinition) -> Result<(), CoreError> {
    let title_len = def.title.trim().chars().count();
    if !(MIN_TITLE_LENGTH..=MAX_TITLE_LENGTH).contains(&title_len) {
        return Err(CoreError::Validation(format!(
            "Achievement title must be between {MIN_TITLE_LENGTH} and {MAX_TITLE_LENGTH} characters"
        )));
    }
    if !(0..=MAX_XP_REWARD).contains(&def.xp_reward) {
        return Err(CoreError::Validation(format!(
            "Achievement XP reward must be between 0 and {MAX_XP_REWARD}"
        )));
    }
    if def.prerequisite_achievement_id == Some(def.id) {
        return Err(CoreError::Validation(
            "An achievement cannot be its own prerequisite".to_string(),
        ));
    }
    objective::validate_criteria(&def.criteria)
}

// ---------------------------------------------------------------------------
// Unlock engine
// ---------------------------------------------------------------------------

/// Unlock every catalog achievement the user newly qualifies for.
///
/// Definitions are visited in catalog order. An achievement whose
/// prerequisite is not yet unlocked is skipped; a prerequisite unlocked
/// earlier in the same pass counts. Each unlock emits `AchievementUnlocked`
/// followed by the XP events for its reward. Already-unlocked and inactive
/// definitions are ignored, so repeated calls are no-ops.
pub fn check_unlocks(
    state: &UserProgressState,
    snapshot: &ProgressSnapshot,
    catalog: &[AchievementDefinition],
) -> Result<(UserProgressState, Vec<UnlockEvent>), CoreError> {
    let mut next = state.clone();
    let mut events = Vec::new();

    for def in catalog {
        if !def.is_active || next.unlocked_achievement_ids.contains(&def.id) {
            continue;
        }
        if let Some(prereq) = def.prerequisite_achievement_id {
            if !next.unlocked_achievement_ids.contains(&prereq) {
                continue;
            }
        }

        if !objective::evaluate(&def.criteria, snapshot)?.completed {
            continue;
        }

        next.unlocked_achievement_ids.insert(def.id);
        events.push(UnlockEvent::AchievementUnlocked {
            achievement_id: def.id,
            xp_reward: def.xp_reward,
        });

        let (rewarded, xp_events) = apply_xp(&next, def.xp_reward)?;
        next = rewarded;
        events.extend(xp_events);
    }

    Ok((next, events))
}
