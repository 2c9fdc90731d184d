//! Objective evaluation.
//!
//! Both achievement criteria and quest objectives are a `(type, target,
//! subject?)` triple. [`evaluate`] resolves the type against a fixed table of
//! snapshot counters and reports whether the target is met.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::progress::ProgressSnapshot;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TYPE_LESSONS_COMPLETED: &str = "lessons_completed";
pub const TYPE_STREAK_DAYS: &str = "streak_days";
pub const TYPE_STREAK_MAINTAINED: &str = "streak_maintained";
pub const TYPE_COURSES_FINISHED: &str = "courses_finished";
pub const TYPE_PERFECT_SCORES: &str = "perfect_scores";
pub const TYPE_TIME_SPENT: &str = "time_spent";
pub const TYPE_SUBJECTS_MASTERED: &str = "subjects_mastered";
pub const TYPE_SUBJECTS_EXPLORED: &str = "subjects_explored";
pub const TYPE_QUIZZES_PASSED: &str = "quizzes_passed";
pub const TYPE_ACHIEVEMENTS_UNLOCKED: &str = "achievements_unlocked";
pub const TYPE_FRIENDS_ADDED: &str = "friends_added";
pub const TYPE_FRIENDS_REFERRED: &str = "friends_referred";
pub const TYPE_CUSTOM: &str = "custom";

/// Every accepted objective type string, aliases included.
pub const VALID_OBJECTIVE_TYPES: &[&str] = &[
    TYPE_LESSONS_COMPLETED,
    TYPE_STREAK_DAYS,
    TYPE_STREAK_MAINTAINED,
    TYPE_COURSES_FINISHED,
    TYPE_PERFECT_SCORES,
    TYPE_TIME_SPENT,
    TYPE_SUBJECTS_MASTERED,
    TYPE_SUBJECTS_EXPLORED,
    TYPE_QUIZZES_PASSED,
    TYPE_ACHIEVEMENTS_UNLOCKED,
    TYPE_FRIENDS_ADDED,
    TYPE_FRIENDS_REFERRED,
    TYPE_CUSTOM,
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The snapshot counter an objective measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveType {
    LessonsCompleted,
    StreakDays,
    CoursesFinished,
    PerfectScores,
    TimeSpent,
    SubjectsMastered,
    /// Subjects with at least one completed lesson or course.
    SubjectsExplored,
    QuizzesPassed,
    AchievementsUnlocked,
    FriendsAdded,
    Custom,
}

impl ObjectiveType {
    /// Parse a stored type string. Aliases map onto their canonical variant.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            TYPE_LESSONS_COMPLETED => Ok(Self::LessonsCompleted),
            TYPE_STREAK_DAYS | TYPE_STREAK_MAINTAINED => Ok(Self::StreakDays),
            TYPE_COURSES_FINISHED => Ok(Self::CoursesFinished),
            TYPE_PERFECT_SCORES => Ok(Self::PerfectScores),
            TYPE_TIME_SPENT => Ok(Self::TimeSpent),
            TYPE_SUBJECTS_MASTERED => Ok(Self::SubjectsMastered),
            TYPE_SUBJECTS_EXPLORED => Ok(Self::SubjectsExplored),
            TYPE_QUIZZES_PASSED => Ok(Self::QuizzesPassed),
            TYPE_ACHIEVEMENTS_UNLOCKED => Ok(Self::AchievementsUnlocked),
            TYPE_FRIENDS_ADDED | TYPE_FRIENDS_REFERRED => Ok(Self::FriendsAdded),
            TYPE_CUSTOM => Ok(Self::Custom),
            other => Err(CoreError::UnknownObjectiveType(other.to_string())),
        }
    }

    /// Canonical type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessonsCompleted => TYPE_LESSONS_COMPLETED,
            Self::StreakDays => TYPE_STREAK_DAYS,
            Self::CoursesFinished => TYPE_COURSES_FINISHED,
            Self::PerfectScores => TYPE_PERFECT_SCORES,
            Self::TimeSpent => TYPE_TIME_SPENT,
            Self::SubjectsMastered => TYPE_SUBJECTS_MASTERED,
            Self::SubjectsExplored => TYPE_SUBJECTS_EXPLORED,
            Self::QuizzesPassed => TYPE_QUIZZES_PASSED,
            Self::AchievementsUnlocked => TYPE_ACHIEVEMENTS_UNLOCKED,
            Self::FriendsAdded => TYPE_FRIENDS_ADDED,
            Self::Custom => TYPE_CUSTOM,
        }
    }
}

/// A measurable target.
///
/// `subject` scopes lesson, course, perfect-score and time objectives to one
/// subject. For `custom` objectives it names the counter, bumped by
/// `counter_incremented` activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    #[serde(rename = "type")]
    pub criteria_type: String,
    pub target: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl Criteria {
    pub fn new(criteria_type: impl Into<String>, target: i64) -> Self {
        Self {
            criteria_type: criteria_type.into(),
            target,
            subject: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// Result of evaluating one objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub completed: bool,
    /// Measured value, clamped to the target.
    pub current_value: i64,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Read the raw counter an objective measures.
fn measure(kind: ObjectiveType, criteria: &Criteria, snapshot: &ProgressSnapshot) -> i64 {
    let scoped = criteria
        .subject
        .as_deref()
        .map(|subject| snapshot.subject(subject).cloned().unwrap_or_default());

    match (kind, scoped) {
        (ObjectiveType::LessonsCompleted, Some(s)) => s.lessons_completed,
        (ObjectiveType::LessonsCompleted, None) => snapshot.lessons_completed,
        (ObjectiveType::CoursesFinished, Some(s)) => s.courses_completed,
        (ObjectiveType::CoursesFinished, None) => snapshot.courses_completed,
        (ObjectiveType::PerfectScores, Some(s)) => s.perfect_scores,
        (ObjectiveType::PerfectScores, None) => snapshot.perfect_scores,
        (ObjectiveType::TimeSpent, Some(s)) => s.total_time_spent,
        (ObjectiveType::TimeSpent, None) => snapshot.total_time_spent,
        (ObjectiveType::StreakDays, _) => snapshot.streak,
        (ObjectiveType::SubjectsMastered, _) => snapshot.subjects_mastered,
        (ObjectiveType::SubjectsExplored, _) => snapshot.subjects_explored,
        (ObjectiveType::QuizzesPassed, _) => snapshot.quizzes_passed,
        (ObjectiveType::AchievementsUnlocked, _) => snapshot.achievements_unlocked,
        (ObjectiveType::FriendsAdded, _) => snapshot.friends_added,
        (ObjectiveType::Custom, _) => criteria
            .subject
            .as_deref()
            .and_then(|key| snapshot.custom.get(key).copied())
            .unwrap_or(0),
    }
}

/// Evaluate `criteria` against a progress snapshot.
///
/// Fails with [`CoreError::UnknownObjectiveType`] if the type string is not
/// in the fixed table.
pub fn evaluate(criteria: &Criteria, snapshot: &ProgressSnapshot) -> Result<Evaluation, CoreError> {
    let kind = ObjectiveType::parse(&criteria.criteria_type)?;
    let value = measure(kind, criteria, snapshot);

    Ok(Evaluation {
        completed: value >= criteria.target,
        current_value: value.min(criteria.target),
    })
}

/// Validate an objective at authoring time.
pub fn validate_criteria(criteria: &Criteria) -> Result<(), CoreError> {
    if !VALID_OBJECTIVE_TYPES.contains(&criteria.criteria_type.as_str()) {
        return Err(CoreError::Validation(format!(
            "Invalid objective type '{}'. Must be one of: {}",
            criteria.criteria_type,
            VALID_OBJECTIVE_TYPES.join(", ")
        )));
    }
    if criteria.target < 1 {
        return Err(CoreError::Validation(
            "Objective target must be at least 1".to_string(),
        ));
    }
    if criteria.criteria_type == TYPE_CUSTOM && criteria.subject.is_none() {
        return Err(CoreError::Validation(
            "Custom objectives must name the counter they read".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::progress::SubjectProgress;

    fn snapshot() -> ProgressSnapshot {
        let mut snapshot = ProgressSnapshot {
            lessons_completed: 12,
            courses_completed: 2,
            perfect_scores: 3,
            total_time_spent: 240,
            subjects_mastered: 2,
            subjects_explored: 3,
            quizzes_passed: 6,
            friends_added: 1,
            streak: 4,
            achievements_unlocked: 5,
            ..ProgressSnapshot::default()
        };
        snapshot.subjects.insert(
            "math".to_string(),
            SubjectProgress {
                lessons_completed: 8,
                courses_completed: 1,
                perfect_scores: 1,
                total_time_spent: 100,
            },
        );
        snapshot.with_custom("forum_posts", 9)
    }

    #[test]
    fn maps_each_type_to_its_counter() {
        let s = snapshot();
        let cases = [
            (TYPE_LESSONS_COMPLETED, 12),
            (TYPE_STREAK_DAYS, 4),
            (TYPE_STREAK_MAINTAINED, 4),
            (TYPE_COURSES_FINISHED, 2),
            (TYPE_PERFECT_SCORES, 3),
            (TYPE_TIME_SPENT, 240),
            (TYPE_SUBJECTS_MASTERED, 2),
            (TYPE_SUBJECTS_EXPLORED, 3),
            (TYPE_QUIZZES_PASSED, 6),
            (TYPE_ACHIEVEMENTS_UNLOCKED, 5),
            (TYPE_FRIENDS_REFERRED, 1),
        ];
        for (kind, expected) in cases {
            let eval = evaluate(&Criteria::new(kind, 1_000), &s).unwrap();
            assert_eq!(eval.current_value, expected, "type {kind}");
            assert!(!eval.completed);
        }
    }

    #[test]
    fn completes_when_target_met() {
        let eval = evaluate(&Criteria::new(TYPE_LESSONS_COMPLETED, 12), &snapshot()).unwrap();
        assert!(eval.completed);
        assert_eq!(eval.current_value, 12);
    }

    #[test]
    fn current_value_clamped_to_target() {
        let eval = evaluate(&Criteria::new(TYPE_TIME_SPENT, 60), &snapshot()).unwrap();
        assert!(eval.completed);
        assert_eq!(eval.current_value, 60);
    }

    #[test]
    fn subject_scopes_lesson_counters() {
        let s = snapshot();
        let math = Criteria::new(TYPE_LESSONS_COMPLETED, 10).with_subject("math");
        assert_eq!(evaluate(&math, &s).unwrap().current_value, 8);

        let art = Criteria::new(TYPE_LESSONS_COMPLETED, 10).with_subject("art");
        assert_eq!(evaluate(&art, &s).unwrap().current_value, 0);
    }

    #[test]
    fn custom_reads_named_counter() {
        let s = snapshot();
        let posts = Criteria::new(TYPE_CUSTOM, 5).with_subject("forum_posts");
        assert!(evaluate(&posts, &s).unwrap().completed);

        let missing = Criteria::new(TYPE_CUSTOM, 5).with_subject("uploads");
        assert_eq!(evaluate(&missing, &s).unwrap().current_value, 0);
    }

    #[test]
    fn unknown_type_rejected() {
        assert_matches!(
            evaluate(&Criteria::new("pages_read", 1), &snapshot()),
            Err(CoreError::UnknownObjectiveType(t)) if t == "pages_read"
        );
    }

    #[test]
    fn parse_round_trips_canonical_names() {
        for name in VALID_OBJECTIVE_TYPES {
            let kind = ObjectiveType::parse(name).unwrap();
            assert_eq!(ObjectiveType::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn validate_rejects_bad_targets_and_types() {
        assert!(validate_criteria(&Criteria::new(TYPE_STREAK_DAYS, 7)).is_ok());
        assert!(validate_criteria(&Criteria::new(TYPE_STREAK_DAYS, 0)).is_err());
        assert!(validate_criteria(&Criteria::new("nope", 3)).is_err());
        assert!(validate_criteria(&Criteria::new(TYPE_CUSTOM, 3)).is_err());
    }
}
