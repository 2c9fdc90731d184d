//! Side effects produced by engine operations.
//!
//! Events are ephemeral: the engine returns them alongside the new state and
//! the caller hands them to the notification collaborator.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Xp};

pub const EVENT_XP_GRANTED: &str = "progression.xp_granted";
pub const EVENT_LEVEL_UP: &str = "progression.level_up";
pub const EVENT_ACHIEVEMENT_UNLOCKED: &str = "progression.achievement_unlocked";
pub const EVENT_QUEST_COMPLETED: &str = "progression.quest_completed";

/// All progression event type names, in the order they are registered.
pub const PROGRESSION_EVENT_TYPES: &[&str] = &[
    EVENT_XP_GRANTED,
    EVENT_LEVEL_UP,
    EVENT_ACHIEVEMENT_UNLOCKED,
    EVENT_QUEST_COMPLETED,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnlockEvent {
    XpGranted {
        delta: Xp,
        total_xp: Xp,
        level: i32,
        xp_in_level: Xp,
    },
    LevelUp {
        level: i32,
    },
    /// `xp_reward` is zero when the achievement was granted as a quest reward.
    AchievementUnlocked {
        achievement_id: DbId,
        xp_reward: Xp,
    },
    QuestCompleted {
        quest_id: DbId,
        xp_awarded: Xp,
    },
}

impl UnlockEvent {
    /// Dot-separated event type name used on the event bus.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::XpGranted { .. } => EVENT_XP_GRANTED,
            Self::LevelUp { .. } => EVENT_LEVEL_UP,
            Self::AchievementUnlocked { .. } => EVENT_ACHIEVEMENT_UNLOCKED,
            Self::QuestCompleted { .. } => EVENT_QUEST_COMPLETED,
        }
    }

    /// The catalog entity this event refers to, if any.
    pub fn source_entity(&self) -> Option<(&'static str, DbId)> {
        match self {
            Self::AchievementUnlocked { achievement_id, .. } => {
                Some(("achievement", *achievement_id))
            }
            Self::QuestCompleted { quest_id, .. } => Some(("quest", *quest_id)),
            Self::XpGranted { .. } | Self::LevelUp { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let event = UnlockEvent::LevelUp { level: 3 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "LEVEL_UP");
        assert_eq!(json["level"], 3);

        let event = UnlockEvent::AchievementUnlocked {
            achievement_id: 4,
            xp_reward: 50,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "ACHIEVEMENT_UNLOCKED");
    }

    #[test]
    fn event_type_names_are_registered() {
        let events = [
            UnlockEvent::XpGranted {
                delta: 1,
                total_xp: 1,
                level: 1,
                xp_in_level: 1,
            },
            UnlockEvent::LevelUp { level: 2 },
            UnlockEvent::AchievementUnlocked {
                achievement_id: 1,
                xp_reward: 0,
            },
            UnlockEvent::QuestCompleted {
                quest_id: 1,
                xp_awarded: 0,
            },
        ];
        for event in &events {
            assert!(PROGRESSION_EVENT_TYPES.contains(&event.event_type()));
        }
    }

    #[test]
    fn only_catalog_events_have_a_source() {
        assert_eq!(UnlockEvent::LevelUp { level: 2 }.source_entity(), None);
        assert_eq!(
            UnlockEvent::QuestCompleted {
                quest_id: 9,
                xp_awarded: 20
            }
            .source_entity(),
            Some(("quest", 9))
        );
    }
}
