//! Per-user progression state and the snapshot read model derived from it.
//!
//! [`UserProgressState`] is the only mutable record the engine works on.
//! Every engine operation takes it by reference and returns a new value, so
//! callers can persist or discard the result as a unit. [`ProgressSnapshot`]
//! flattens the state into the counters that objectives and achievement
//! criteria are evaluated against.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{DbId, SubjectId, Timestamp, Xp};

/// Courses a user must finish in a subject before it counts as mastered.
pub const COURSES_FOR_MASTERY: i64 = 1;

/// Learning counters tracked per subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    pub lessons_completed: i64,
    pub courses_completed: i64,
    pub perfect_scores: i64,
    /// Minutes spent in lessons for this subject.
    pub total_time_spent: i64,
}

impl SubjectProgress {
    pub fn is_mastered(&self) -> bool {
        self.courses_completed >= COURSES_FOR_MASTERY
    }

    pub fn is_explored(&self) -> bool {
        self.lessons_completed > 0 || self.courses_completed > 0
    }
}

/// A user's complete progression record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgressState {
    pub user_id: DbId,
    pub total_xp: Xp,
    pub level: i32,
    pub xp_in_level: Xp,
    pub streak: i32,
    pub longest_streak: i32,
    pub last_activity_at: Timestamp,
    pub unlocked_achievement_ids: BTreeSet<DbId>,
    pub completed_quest_ids: BTreeSet<DbId>,
    pub subject_progress: BTreeMap<SubjectId, SubjectProgress>,
    pub quizzes_passed: i64,
    pub friends_added: i64,
    /// Named counters read by `custom` objectives.
    #[serde(default)]
    pub custom_counters: BTreeMap<String, i64>,
    /// Optimistic-concurrency counter. Owned by the repository layer; the
    /// engine carries it through untouched.
    pub version: i64,
}

impl UserProgressState {
    /// Zero-valued state for a user who signed up at `now`.
    pub fn new(user_id: DbId, now: Timestamp) -> Self {
        Self {
            user_id,
            total_xp: 0,
            level: 1,
            xp_in_level: 0,
            streak: 0,
            longest_streak: 0,
            last_activity_at: now,
            unlocked_achievement_ids: BTreeSet::new(),
            completed_quest_ids: BTreeSet::new(),
            subject_progress: BTreeMap::new(),
            quizzes_passed: 0,
            friends_added: 0,
            custom_counters: BTreeMap::new(),
            version: 0,
        }
    }

    /// Mutable access to a subject's counters, creating them on first use.
    pub fn subject_mut(&mut self, subject: &str) -> &mut SubjectProgress {
        self.subject_progress.entry(subject.to_string()).or_default()
    }

    /// Build the evaluation snapshot for this state.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::from_state(self)
    }
}

/// Flattened counters used by the objective evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub lessons_completed: i64,
    pub courses_completed: i64,
    pub perfect_scores: i64,
    pub total_time_spent: i64,
    pub subjects_mastered: i64,
    pub subjects_explored: i64,
    pub quizzes_passed: i64,
    pub friends_added: i64,
    pub streak: i64,
    pub achievements_unlocked: i64,
    pub subjects: BTreeMap<SubjectId, SubjectProgress>,
    /// Counters for `custom` objectives, keyed by name.
    pub custom: BTreeMap<String, i64>,
}

impl ProgressSnapshot {
    /// Aggregate a user's per-subject counters into a snapshot.
    ///
    /// Sums saturate rather than overflow.
    pub fn from_state(state: &UserProgressState) -> Self {
        let mut snapshot = Self {
            quizzes_passed: state.quizzes_passed,
            friends_added: state.friends_added,
            streak: i64::from(state.streak),
            achievements_unlocked: state.unlocked_achievement_ids.len() as i64,
            subjects: state.subject_progress.clone(),
            custom: state.custom_counters.clone(),
            ..Self::default()
        };

        for progress in state.subject_progress.values() {
            snapshot.lessons_completed = snapshot
                .lessons_completed
                .saturating_add(progress.lessons_completed);
            snapshot.courses_completed = snapshot
                .courses_completed
                .saturating_add(progress.courses_completed);
            snapshot.perfect_scores = snapshot
                .perfect_scores
                .saturating_add(progress.perfect_scores);
            snapshot.total_time_spent = snapshot
                .total_time_spent
                .saturating_add(progress.total_time_spent);
            if progress.is_mastered() {
                snapshot.subjects_mastered += 1;
            }
            if progress.is_explored() {
                snapshot.subjects_explored += 1;
            }
        }

        snapshot
    }

    /// Attach a custom counter.
    pub fn with_custom(mut self, key: impl Into<String>, value: i64) -> Self {
        self.custom.insert(key.into(), value);
        self
    }

    pub fn subject(&self, subject: &str) -> Option<&SubjectProgress> {
        self.subjects.get(subject)
    }
}
