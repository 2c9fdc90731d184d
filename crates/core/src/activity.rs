//! Learning activities and the full progression pass they trigger.
//!
//! [`process_activity`] is the single entry point callers use after a user
//! does something: it chains the streak tracker, counter updates, the XP
//! ledger, the achievement unlock engine and the quest engine, and returns
//! the combined outcome without touching storage.

use serde::{Deserialize, Serialize};

use crate::achievement::{check_unlocks, AchievementDefinition};
use crate::error::CoreError;
use crate::events::UnlockEvent;
use crate::progress::UserProgressState;
use crate::quest::{advance_quest, QuestDefinition};
use crate::streak::update_streak;
use crate::types::{SubjectId, Timestamp, Xp};
use crate::xp::apply_xp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MAX_LESSON_XP: Xp = 1_000;
pub const MAX_COURSE_XP: Xp = 10_000;
pub const PERFECT_SCORE: u8 = 100;
/// Longest lesson, in minutes, a single activity may report.
pub const MAX_TIME_SPENT: i64 = 300;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Activity {
    Login,
    LessonCompleted {
        subject: SubjectId,
        xp_reward: Xp,
        /// Minutes spent on the lesson.
        time_spent: i64,
        score: Option<u8>,
    },
    CourseCompleted {
        subject: SubjectId,
        xp_reward: Xp,
    },
    QuizPassed {
        subject: SubjectId,
        xp_reward: Xp,
        score: u8,
    },
    FriendAdded,
    XpAwarded {
        amount: Xp,
    },
    /// Bumps a named counter read by `custom` objectives.
    CounterIncremented {
        key: String,
        by: i64,
    },
}

impl Activity {
    /// XP the activity itself grants, before any unlock rewards.
    pub fn xp(&self) -> Xp {
        match self {
            Self::LessonCompleted { xp_reward, .. }
            | Self::CourseCompleted { xp_reward, .. }
            | Self::QuizPassed { xp_reward, .. } => *xp_reward,
            Self::XpAwarded { amount } => *amount,
            Self::Login | Self::FriendAdded | Self::CounterIncremented { .. } => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::LessonCompleted { .. } => "lesson_completed",
            Self::CourseCompleted { .. } => "course_completed",
            Self::QuizPassed { .. } => "quiz_passed",
            Self::FriendAdded => "friend_added",
            Self::XpAwarded { .. } => "xp_awarded",
            Self::CounterIncremented { .. } => "counter_incremented",
        }
    }
}

/// Everything a progression pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionOutcome {
    pub state: UserProgressState,
    /// Quest instances in the order they were supplied, advanced where eligible.
    pub quests: Vec<QuestDefinition>,
    pub events: Vec<UnlockEvent>,
}

impl ProgressionOutcome {
    pub fn leveled_up(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, UnlockEvent::LevelUp { .. }))
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject activities whose rewards or measurements are out of range.
pub fn validate_activity(activity: &Activity) -> Result<(), CoreError> {
    let (xp, cap) = match activity {
        Activity::LessonCompleted { xp_reward, .. } | Activity::QuizPassed { xp_reward, .. } => {
            (*xp_reward, MAX_LESSON_XP)
        }
        Activity::CourseCompleted { xp_reward, .. } => (*xp_reward, MAX_COURSE_XP),
        Activity::XpAwarded { amount } => (*amount, Xp::MAX),
        Activity::Login | Activity::FriendAdded | Activity::CounterIncremented { .. } => (0, 0),
    };
    if xp > cap {
        return Err(CoreError::Validation(format!(
            "{} XP reward {xp} exceeds the maximum of {cap}",
            activity.name()
        )));
    }

    match activity {
        Activity::LessonCompleted { time_spent, .. } if *time_spent < 0 => Err(
            CoreError::Validation("Time spent cannot be negative".to_string()),
        ),
        Activity::LessonCompleted { time_spent, .. } if *time_spent > MAX_TIME_SPENT => {
            Err(CoreError::Validation(format!(
                "Time spent {time_spent} exceeds the maximum of {MAX_TIME_SPENT} minutes"
            )))
        }
        Activity::CounterIncremented { key, .. } if key.trim().is_empty() => Err(
            CoreError::Validation("Counter key is required".to_string()),
        ),
        Activity::CounterIncremented { by, .. } if *by < 1 => Err(CoreError::Validation(
            format!("Counter increment must be positive, got {by}"),
        )),
        Activity::LessonCompleted {
            score: Some(score), ..
        }
        | Activity::QuizPassed { score, .. }
            if *score > PERFECT_SCORE =>
        {
            Err(CoreError::Validation(format!(
                "Score {score} exceeds {PERFECT_SCORE}"
            )))
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

fn bump(counter: &mut i64, by: i64, name: &str) -> Result<(), CoreError> {
    *counter = counter
        .checked_add(by)
        .ok_or_else(|| CoreError::Validation(format!("Counter {name} would overflow")))?;
    Ok(())
}

fn apply_counters(state: &mut UserProgressState, activity: &Activity) -> Result<(), CoreError> {
    match activity {
        Activity::LessonCompleted {
            subject,
            time_spent,
            score,
            ..
        } => {
            let progress = state.subject_mut(subject);
            bump(&mut progress.lessons_completed, 1, "lessons_completed")?;
            bump(&mut progress.total_time_spent, *time_spent, "total_time_spent")?;
            if *score == Some(PERFECT_SCORE) {
                bump(&mut progress.perfect_scores, 1, "perfect_scores")?;
            }
        }
        Activity::CourseCompleted { subject, .. } => {
            bump(
                &mut state.subject_mut(subject).courses_completed,
                1,
                "courses_completed",
            )?;
        }
        Activity::QuizPassed { subject, score, .. } => {
            bump(&mut state.quizzes_passed, 1, "quizzes_passed")?;
            if *score == PERFECT_SCORE {
                bump(
                    &mut state.subject_mut(subject).perfect_scores,
                    1,
                    "perfect_scores",
                )?;
            }
        }
        Activity::FriendAdded => bump(&mut state.friends_added, 1, "friends_added")?,
        Activity::CounterIncremented { key, by } => {
            let counter = state.custom_counters.entry(key.clone()).or_insert(0);
            bump(counter, *by, key)?;
        }
        Activity::Login | Activity::XpAwarded { .. } => {}
    }
    Ok(())
}

/// Run one activity through the whole engine.
///
/// Steps, in order: streak update, counter update, activity XP, achievement
/// unlocks, then each quest. Quests the user is not eligible for are passed
/// through unchanged rather than failing the pass. Any other error aborts the
/// pass and the caller's state is left as it was.
pub fn process_activity(
    state: &UserProgressState,
    activity: &Activity,
    now: Timestamp,
    achievements: &[AchievementDefinition],
    quests: &[QuestDefinition],
) -> Result<ProgressionOutcome, CoreError> {
    validate_activity(activity)?;

    let mut next = update_streak(state, now)?;
    apply_counters(&mut next, activity)?;

    let (next, mut events) = apply_xp(&next, activity.xp())?;

    let (mut next, unlock_events) = check_unlocks(&next, &next.snapshot(), achievements)?;
    events.extend(unlock_events);

    let mut advanced = Vec::with_capacity(quests.len());
    for quest in quests {
        match advance_quest(quest, &next.snapshot(), &next, now) {
            Ok((quest, user, quest_events)) => {
                next = user;
                events.extend(quest_events);
                advanced.push(quest);
            }
            Err(CoreError::QuestIneligible { .. }) => advanced.push(quest.clone()),
            Err(e) => return Err(e),
        }
    }

    Ok(ProgressionOutcome {
        state: next,
        quests: advanced,
        events,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::achievement::{AchievementCategory, Rarity, Tier};
    use crate::objective::{Criteria, TYPE_CUSTOM, TYPE_LESSONS_COMPLETED, TYPE_PERFECT_SCORES};
    use crate::quest::{
        QuestDifficulty, QuestObjective, QuestPrerequisites, QuestRewards, QuestType,
    };

    fn signup() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    fn lesson(score: Option<u8>) -> Activity {
        Activity::LessonCompleted {
            subject: "math".to_string(),
            xp_reward: 30,
            time_spent: 15,
            score,
        }
    }

    fn first_lesson_badge() -> AchievementDefinition {
        AchievementDefinition {
            id: 1,
            title: "First Steps".to_string(),
            category: AchievementCategory::Learning,
            rarity: Rarity::Common,
            tier: Tier::Bronze,
            xp_reward: 50,
            criteria: Criteria::new(TYPE_LESSONS_COMPLETED, 1),
            prerequisite_achievement_id: None,
            secret: false,
            is_active: true,
        }
    }

    fn perfect_quest(min_level: i32) -> QuestDefinition {
        QuestDefinition {
            id: 10,
            title: "Flawless lesson".to_string(),
            quest_type: QuestType::Daily,
            difficulty: QuestDifficulty::Easy,
            objectives: vec![QuestObjective::new(Criteria::new(TYPE_PERFECT_SCORES, 1))],
            rewards: QuestRewards {
                xp: 20,
                achievement_ids: vec![],
                bonus_multiplier: 1.0,
            },
            prerequisites: QuestPrerequisites {
                min_level,
                ..QuestPrerequisites::default()
            },
            time_window: None,
            participants: Default::default(),
            progress: 0,
            completed: false,
        }
    }

    #[test]
    fn lesson_runs_full_pipeline() {
        let state = UserProgressState::new(1, signup());
        let now = signup() + Duration::days(1);

        let outcome = process_activity(
            &state,
            &lesson(Some(100)),
            now,
            &[first_lesson_badge()],
            &[perfect_quest(1)],
        )
        .unwrap();

        // 30 lesson + 50 badge + 20 quest
        assert_eq!(outcome.state.total_xp, 100);
        assert_eq!(outcome.state.level, 2);
        assert_eq!(outcome.state.streak, 1);
        assert!(outcome.state.unlocked_achievement_ids.contains(&1));
        assert!(outcome.state.completed_quest_ids.contains(&10));
        assert!(outcome.quests[0].completed);
        assert!(outcome.leveled_up());

        let kinds: Vec<&str> = outcome.events.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            kinds,
            vec![
                "progression.xp_granted",
                "progression.achievement_unlocked",
                "progression.xp_granted",
                "progression.quest_completed",
                "progression.xp_granted",
                "progression.level_up",
            ]
        );
    }

    #[test]
    fn ineligible_quests_pass_through() {
        let state = UserProgressState::new(1, signup());
        let outcome = process_activity(
            &state,
            &lesson(Some(100)),
            signup(),
            &[],
            &[perfect_quest(5)],
        )
        .unwrap();
        assert_eq!(outcome.quests[0], perfect_quest(5));
        assert!(outcome.state.completed_quest_ids.is_empty());
    }

    #[test]
    fn counters_follow_activity() {
        let state = UserProgressState::new(1, signup());
        let now = signup();
        let quiz = Activity::QuizPassed {
            subject: "math".to_string(),
            xp_reward: 10,
            score: 100,
        };
        let outcome = process_activity(&state, &quiz, now, &[], &[]).unwrap();
        assert_eq!(outcome.state.quizzes_passed, 1);
        assert_eq!(outcome.state.subject_progress["math"].perfect_scores, 1);

        let outcome = process_activity(&outcome.state, &Activity::FriendAdded, now, &[], &[])
            .unwrap();
        assert_eq!(outcome.state.friends_added, 1);

        let course = Activity::CourseCompleted {
            subject: "math".to_string(),
            xp_reward: 500,
        };
        let outcome = process_activity(&outcome.state, &course, now, &[], &[]).unwrap();
        assert_eq!(outcome.state.snapshot().subjects_mastered, 1);
        assert_eq!(outcome.state.total_xp, 510);
    }

    #[test]
    fn login_only_touches_streak() {
        let mut state = UserProgressState::new(1, signup());
        state.streak = 2;
        state.longest_streak = 2;
        let outcome = process_activity(
            &state,
            &Activity::Login,
            signup() + Duration::days(1),
            &[],
            &[],
        )
        .unwrap();
        assert_eq!(outcome.state.streak, 3);
        assert_eq!(outcome.state.total_xp, 0);
    }

    #[test]
    fn clock_skew_aborts_pass() {
        let state = UserProgressState::new(1, signup());
        assert_matches!(
            process_activity(
                &state,
                &lesson(None),
                signup() - Duration::hours(1),
                &[],
                &[]
            ),
            Err(CoreError::ClockSkew { .. })
        );
    }

    #[test]
    fn validation_caps_rewards_and_scores() {
        let greedy = Activity::LessonCompleted {
            subject: "math".to_string(),
            xp_reward: MAX_LESSON_XP + 1,
            time_spent: 5,
            score: None,
        };
        assert_matches!(validate_activity(&greedy), Err(CoreError::Validation(_)));

        let impossible = Activity::QuizPassed {
            subject: "math".to_string(),
            xp_reward: 10,
            score: 120,
        };
        assert_matches!(validate_activity(&impossible), Err(CoreError::Validation(_)));

        assert_matches!(
            validate_activity(&Activity::XpAwarded { amount: -1 }),
            Ok(())
        );
        assert!(validate_activity(&lesson(Some(90))).is_ok());
    }

    #[test]
    fn time_spent_is_bounded() {
        let marathon = Activity::LessonCompleted {
            subject: "math".to_string(),
            xp_reward: 10,
            time_spent: MAX_TIME_SPENT + 1,
            score: None,
        };
        assert_matches!(validate_activity(&marathon), Err(CoreError::Validation(_)));

        let state = UserProgressState::new(1, signup());
        assert_matches!(
            process_activity(&state, &marathon, signup(), &[], &[]),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn counter_overflow_fails_the_pass() {
        let mut state = UserProgressState::new(1, signup());
        state.subject_mut("math").total_time_spent = i64::MAX - 5;

        assert_matches!(
            process_activity(&state, &lesson(None), signup(), &[], &[]),
            Err(CoreError::Validation(_))
        );

        state.friends_added = i64::MAX;
        assert_matches!(
            process_activity(&state, &Activity::FriendAdded, signup(), &[], &[]),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn custom_counter_drives_custom_quest() {
        let mut quest = perfect_quest(1);
        quest.objectives = vec![QuestObjective::new(
            Criteria::new(TYPE_CUSTOM, 3).with_subject("forum_posts"),
        )];

        let post = Activity::CounterIncremented {
            key: "forum_posts".to_string(),
            by: 2,
        };
        let state = UserProgressState::new(1, signup());
        let outcome = process_activity(&state, &post, signup(), &[], &[quest]).unwrap();
        assert_eq!(outcome.state.custom_counters["forum_posts"], 2);
        assert!(!outcome.quests[0].completed);

        let post = Activity::CounterIncremented {
            key: "forum_posts".to_string(),
            by: 1,
        };
        let outcome =
            process_activity(&outcome.state, &post, signup(), &[], &outcome.quests).unwrap();
        assert!(outcome.quests[0].completed);
        assert!(outcome.state.completed_quest_ids.contains(&10));
        assert_eq!(outcome.state.total_xp, 20);
    }

    #[test]
    fn counter_increments_are_validated() {
        let blank = Activity::CounterIncremented {
            key: " ".to_string(),
            by: 1,
        };
        assert_matches!(validate_activity(&blank), Err(CoreError::Validation(_)));

        let zero = Activity::CounterIncremented {
            key: "forum_posts".to_string(),
            by: 0,
        };
        assert_matches!(validate_activity(&zero), Err(CoreError::Validation(_)));
    }

    #[test]
    fn negative_award_rejected_by_ledger() {
        let state = UserProgressState::new(1, signup());
        assert_matches!(
            process_activity(&state, &Activity::XpAwarded { amount: -1 }, signup(), &[], &[]),
            Err(CoreError::InvalidDelta(-1))
        );
    }

    #[test]
    fn activity_deserializes_from_tagged_json() {
        let json = serde_json::json!({
            "type": "lesson_completed",
            "subject": "physics",
            "xp_reward": 25,
            "time_spent": 12,
            "score": 100
        });
        let activity: Activity = serde_json::from_value(json).unwrap();
        assert_eq!(activity.xp(), 25);
        assert_eq!(activity.name(), "lesson_completed");
    }
}
