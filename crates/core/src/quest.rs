//! Quest definitions, participation rules and the completion engine.
//!
//! A quest instance carries its own objective progress. [`advance_quest`]
//! re-evaluates every objective against a fresh snapshot, derives the
//! aggregate progress percentage and pays out rewards exactly once.

use std::collections::BTreeSet;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, IneligibleReason};
use crate::events::UnlockEvent;
use crate::objective::{self, Criteria, ObjectiveType};
use crate::progress::{ProgressSnapshot, UserProgressState};
use crate::types::{DbId, Timestamp, Xp};
use crate::xp::apply_xp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MIN_TITLE_LENGTH: usize = 5;
pub const MAX_TITLE_LENGTH: usize = 150;
pub const MAX_XP_REWARD: Xp = 5_000;
pub const MIN_BONUS_MULTIPLIER: f64 = 1.0;
pub const MAX_BONUS_MULTIPLIER: f64 = 10.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Seasonal,
    Achievement,
    Story,
    Challenge,
    Social,
}

impl QuestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Seasonal => "seasonal",
            Self::Achievement => "achievement",
            Self::Story => "story",
            Self::Challenge => "challenge",
            Self::Social => "social",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "seasonal" => Ok(Self::Seasonal),
            "achievement" => Ok(Self::Achievement),
            "story" => Ok(Self::Story),
            "challenge" => Ok(Self::Challenge),
            "social" => Ok(Self::Social),
            _ => Err(CoreError::Validation(format!("Invalid quest type '{s}'"))),
        }
    }
}

/// Authored difficulty tier. Raises the estimated difficulty score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestDifficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Expert,
}

impl QuestDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Expert => "expert",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            "expert" => Ok(Self::Expert),
            _ => Err(CoreError::Validation(format!(
                "Invalid quest difficulty '{s}'"
            ))),
        }
    }

    fn bonus(&self) -> i64 {
        match self {
            Self::Easy => 0,
            Self::Medium => 20,
            Self::Hard => 40,
            Self::Expert => 60,
        }
    }
}

/// One measurable sub-goal of a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestObjective {
    #[serde(flatten)]
    pub criteria: Criteria,
    #[serde(default)]
    pub current: i64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl QuestObjective {
    pub fn new(criteria: Criteria) -> Self {
        Self {
            criteria,
            current: 0,
            completed: false,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestRewards {
    pub xp: Xp,
    #[serde(default)]
    pub achievement_ids: Vec<DbId>,
    #[serde(default = "default_multiplier")]
    pub bonus_multiplier: f64,
}

fn default_multiplier() -> f64 {
    MIN_BONUS_MULTIPLIER
}

impl QuestRewards {
    /// XP paid out on completion, after the bonus multiplier.
    pub fn total_xp(&self) -> Xp {
        (self.xp as f64 * self.bonus_multiplier).round() as Xp
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestPrerequisites {
    #[serde(default = "default_min_level")]
    pub min_level: i32,
    #[serde(default)]
    pub required_quest_ids: Vec<DbId>,
    #[serde(default)]
    pub required_achievement_ids: Vec<DbId>,
}

fn default_min_level() -> i32 {
    1
}

impl Default for QuestPrerequisites {
    fn default() -> Self {
        Self {
            min_level: default_min_level(),
            required_quest_ids: Vec::new(),
            required_achievement_ids: Vec::new(),
        }
    }
}

/// Inclusive availability window. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participants {
    #[serde(default)]
    pub user_ids: BTreeSet<DbId>,
    #[serde(default)]
    pub max: Option<u32>,
    /// When non-empty, only these users may take part.
    #[serde(default)]
    pub whitelist: Vec<DbId>,
}

impl Participants {
    pub fn current(&self) -> usize {
        self.user_ids.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestDefinition {
    pub id: DbId,
    pub title: String,
    #[serde(rename = "type", default)]
    pub quest_type: QuestType,
    #[serde(default)]
    pub difficulty: QuestDifficulty,
    pub objectives: Vec<QuestObjective>,
    pub rewards: QuestRewards,
    #[serde(default)]
    pub prerequisites: QuestPrerequisites,
    #[serde(default)]
    pub time_window: Option<TimeWindow>,
    #[serde(default)]
    pub participants: Participants,
    /// Derived from the objectives by [`advance_quest`].
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub completed: bool,
}

impl QuestDefinition {
    /// Rough 0-100 difficulty score from objective count, targets and tier.
    pub fn estimated_difficulty(&self) -> u8 {
        let count = (self.objectives.len() as i64).saturating_mul(10);
        let targets = self
            .objectives
            .iter()
            .fold(0i64, |sum, o| sum.saturating_add(o.criteria.target));
        count
            .saturating_add(targets)
            .saturating_add(self.difficulty.bonus())
            .clamp(0, 100) as u8
    }

    /// Time left before the window closes, or `None` for open-ended quests.
    pub fn time_remaining(&self, now: Timestamp) -> Option<Duration> {
        let end = self.time_window.and_then(|w| w.end)?;
        Some((end - now).max(Duration::zero()))
    }
}

/// Percentage of objectives completed, rounded.
pub fn compute_progress(objectives: &[QuestObjective]) -> u8 {
    if objectives.is_empty() {
        return 0;
    }
    let done = objectives.iter().filter(|o| o.completed).count();
    (done as f64 / objectives.len() as f64 * 100.0).round() as u8
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a quest definition before it enters the catalog.
pub fn validate_quest(quest: &QuestDefinition) -> Result<(), CoreError> {
    let title_len = quest.title.trim().chars().count();
    if !(MIN_TITLE_LENGTH..=MAX_TITLE_LENGTH).contains(&title_len) {
        return Err(CoreError::Validation(format!(
            "Quest title must be between {MIN_TITLE_LENGTH} and {MAX_TITLE_LENGTH} characters"
        )));
    }
    if quest.objectives.is_empty() {
        return Err(CoreError::Validation(
            "A quest must have at least one objective".to_string(),
        ));
    }
    for objective in &quest.objectives {
        objective::validate_criteria(&objective.criteria)?;
    }
    if !(0..=MAX_XP_REWARD).contains(&quest.rewards.xp) {
        return Err(CoreError::Validation(format!(
            "Quest XP reward must be between 0 and {MAX_XP_REWARD}"
        )));
    }
    if !(MIN_BONUS_MULTIPLIER..=MAX_BONUS_MULTIPLIER).contains(&quest.rewards.bonus_multiplier) {
        return Err(CoreError::Validation(format!(
            "Bonus multiplier must be between {MIN_BONUS_MULTIPLIER} and {MAX_BONUS_MULTIPLIER}"
        )));
    }
    if quest.prerequisites.min_level < 1 {
        return Err(CoreError::Validation(
            "Required level cannot be less than 1".to_string(),
        ));
    }
    if let Some(TimeWindow {
        start: Some(start),
        end: Some(end),
    }) = quest.time_window
    {
        if end < start {
            return Err(CoreError::Validation(
                "Quest window must end after it starts".to_string(),
            ));
        }
    }
    if quest.participants.max == Some(0) {
        return Err(CoreError::Validation(
            "Max participants must be at least 1".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Participation
// ---------------------------------------------------------------------------

/// Check whether a user may take part in `quest` at `now`.
pub fn can_participate(
    quest: &QuestDefinition,
    user: &UserProgressState,
    now: Timestamp,
) -> Result<(), IneligibleReason> {
    let prereq = &quest.prerequisites;
    if user.level < prereq.min_level {
        return Err(IneligibleReason::BelowMinLevel {
            required: prereq.min_level,
            actual: user.level,
        });
    }
    if let Some(missing) = prereq
        .required_quest_ids
        .iter()
        .find(|id| !user.completed_quest_ids.contains(*id))
    {
        return Err(IneligibleReason::MissingQuest(*missing));
    }
    if let Some(missing) = prereq
        .required_achievement_ids
        .iter()
        .find(|id| !user.unlocked_achievement_ids.contains(*id))
    {
        return Err(IneligibleReason::MissingAchievement(*missing));
    }

    if let Some(window) = quest.time_window {
        if let Some(start) = window.start.filter(|start| now < *start) {
            return Err(IneligibleReason::NotStarted(start));
        }
        if let Some(end) = window.end.filter(|end| now > *end) {
            return Err(IneligibleReason::Expired(end));
        }
    }

    let participants = &quest.participants;
    if !participants.whitelist.is_empty() && !participants.whitelist.contains(&user.user_id) {
        return Err(IneligibleReason::NotWhitelisted);
    }
    if !participants.user_ids.contains(&user.user_id) {
        if let Some(max) = participants.max {
            if participants.current() >= max as usize {
                return Err(IneligibleReason::ParticipantLimitReached(max));
            }
        }
    }

    Ok(())
}

/// Add a user to a quest's participants after checking eligibility.
pub fn join_quest(
    quest: &QuestDefinition,
    user: &UserProgressState,
    now: Timestamp,
) -> Result<QuestDefinition, CoreError> {
    can_participate(quest, user, now).map_err(|reason| CoreError::QuestIneligible {
        quest_id: quest.id,
        reason,
    })?;
    let mut next = quest.clone();
    next.participants.user_ids.insert(user.user_id);
    Ok(next)
}

// ---------------------------------------------------------------------------
// Completion engine
// ---------------------------------------------------------------------------

/// Re-evaluate a quest's objectives and pay out rewards on completion.
///
/// Completed quests (either flagged on the instance or recorded on the user)
/// are returned unchanged with no events. Otherwise the user must pass
/// [`can_participate`]. On reaching 100% the quest is marked complete, its
/// id is recorded on the user, reward achievements are granted and
/// `rewards.xp * bonus_multiplier` XP is applied. Events are emitted as
/// `QuestCompleted`, then reward unlocks, then XP events.
pub fn advance_quest(
    quest: &QuestDefinition,
    snapshot: &ProgressSnapshot,
    user: &UserProgressState,
    now: Timestamp,
) -> Result<(QuestDefinition, UserProgressState, Vec<UnlockEvent>), CoreError> {
    if quest.completed || user.completed_quest_ids.contains(&quest.id) {
        return Ok((quest.clone(), user.clone(), Vec::new()));
    }

    let mut next_quest = join_quest(quest, user, now)?;

    for objective in &mut next_quest.objectives {
        // Unknown types fail even on completed objectives.
        ObjectiveType::parse(&objective.criteria.criteria_type)?;
        if objective.completed {
            continue;
        }
        let eval = objective::evaluate(&objective.criteria, snapshot)?;
        objective.current = eval.current_value;
        objective.completed = eval.completed;
    }
    next_quest.progress = compute_progress(&next_quest.objectives);

    if next_quest.progress < 100 {
        return Ok((next_quest, user.clone(), Vec::new()));
    }

    next_quest.completed = true;
    let xp_awarded = next_quest.rewards.total_xp();
    let mut events = vec![UnlockEvent::QuestCompleted {
        quest_id: quest.id,
        xp_awarded,
    }];

    let mut next_user = user.clone();
    next_user.completed_quest_ids.insert(quest.id);
    for achievement_id in &next_quest.rewards.achievement_ids {
        if next_user.unlocked_achievement_ids.insert(*achievement_id) {
            events.push(UnlockEvent::AchievementUnlocked {
                achievement_id: *achievement_id,
                xp_reward: 0,
            });
        }
    }

    let (next_user, xp_events) = apply_xp(&next_user, xp_awarded)?;
    events.extend(xp_events);

    Ok((next_quest, next_user, events))
}
