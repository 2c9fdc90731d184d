use crate::types::{DbId, Timestamp, Xp};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid XP delta {0}: must be a non-negative amount that fits the ledger")]
    InvalidDelta(Xp),

    #[error("Clock skew: activity at {now} is earlier than last activity at {last_activity}")]
    ClockSkew {
        now: Timestamp,
        last_activity: Timestamp,
    },

    #[error("Unknown objective type '{0}'")]
    UnknownObjectiveType(String),

    #[error("User cannot participate in quest {quest_id}: {reason}")]
    QuestIneligible {
        quest_id: DbId,
        reason: IneligibleReason,
    },
}

/// Why a user failed a quest's participation check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IneligibleReason {
    #[error("requires level {required}, user is level {actual}")]
    BelowMinLevel { required: i32, actual: i32 },

    #[error("prerequisite quest {0} not completed")]
    MissingQuest(DbId),

    #[error("prerequisite achievement {0} not unlocked")]
    MissingAchievement(DbId),

    #[error("quest window opens at {0}")]
    NotStarted(Timestamp),

    #[error("quest window closed at {0}")]
    Expired(Timestamp),

    #[error("participant limit of {0} reached")]
    ParticipantLimitReached(u32),

    #[error("user is not on the quest whitelist")]
    NotWhitelisted,
}
