//! Daily activity streaks.

use chrono::Duration;

use crate::error::CoreError;
use crate::progress::UserProgressState;
use crate::types::Timestamp;

/// Whole days elapsed between the last activity and `now` (truncated).
fn days_since(last_activity: Timestamp, now: Timestamp) -> i64 {
    (now - last_activity).num_days()
}

/// Advance a user's streak for an activity occurring at `now`.
///
/// - Same day: streak unchanged.
/// - Next day: streak grows by one.
/// - Two or more days later: streak restarts at 1.
///
/// `last_activity_at` always moves to `now`. An activity earlier than the last
/// recorded one is rejected with [`CoreError::ClockSkew`].
pub fn update_streak(
    state: &UserProgressState,
    now: Timestamp,
) -> Result<UserProgressState, CoreError> {
    if now < state.last_activity_at {
        return Err(CoreError::ClockSkew {
            now,
            last_activity: state.last_activity_at,
        });
    }

    let mut next = state.clone();
    match days_since(state.last_activity_at, now) {
        0 => {}
        1 => next.streak += 1,
        _ => next.streak = 1,
    }
    next.longest_streak = next.longest_streak.max(next.streak);
    next.last_activity_at = now;

    Ok(next)
}

/// The streak as it should be displayed at `now`.
///
/// A streak survives until the end of the day after the last activity; after
/// that it reads as 0 even though the stored value is only reset on the next
/// activity.
pub fn effective_streak(state: &UserProgressState, now: Timestamp) -> i32 {
    if now < state.last_activity_at {
        return state.streak;
    }
    if now - state.last_activity_at >= Duration::days(2) {
        0
    } else {
        state.streak
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn on_streak(streak: i32, longest: i32) -> UserProgressState {
        let mut state =
            UserProgressState::new(1, Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap());
        state.streak = streak;
        state.longest_streak = longest;
        state
    }

    #[test]
    fn next_day_increments() {
        let state = on_streak(5, 5);
        let now = state.last_activity_at + Duration::days(1);
        let next = update_streak(&state, now).unwrap();
        assert_eq!(next.streak, 6);
        assert_eq!(next.longest_streak, 6);
        assert_eq!(next.last_activity_at, now);
    }

    #[test]
    fn gap_resets_to_one() {
        let state = on_streak(5, 5);
        let now = state.last_activity_at + Duration::days(2);
        let next = update_streak(&state, now).unwrap();
        assert_eq!(next.streak, 1);
        assert_eq!(next.longest_streak, 5);
    }

    #[test]
    fn same_day_unchanged() {
        let state = on_streak(5, 5);
        let now = state.last_activity_at + Duration::hours(3);
        let next = update_streak(&state, now).unwrap();
        assert_eq!(next.streak, 5);
        assert_eq!(next.longest_streak, 5);
        assert_eq!(next.last_activity_at, now);
    }

    #[test]
    fn partial_days_are_truncated() {
        let state = on_streak(2, 4);
        let now = state.last_activity_at + Duration::hours(47);
        let next = update_streak(&state, now).unwrap();
        assert_eq!(next.streak, 3);
        assert_eq!(next.longest_streak, 4);
    }

    #[test]
    fn reset_from_zero_keeps_longest_at_least_streak() {
        let state = on_streak(0, 0);
        let now = state.last_activity_at + Duration::days(10);
        let next = update_streak(&state, now).unwrap();
        assert_eq!(next.streak, 1);
        assert_eq!(next.longest_streak, 1);
    }

    #[test]
    fn earlier_timestamp_is_clock_skew() {
        let state = on_streak(5, 5);
        let now = state.last_activity_at - Duration::minutes(1);
        assert_matches!(update_streak(&state, now), Err(CoreError::ClockSkew { .. }));
    }

    #[test]
    fn effective_streak_lapses_after_a_missed_day() {
        let state = on_streak(4, 4);
        let t = state.last_activity_at;
        assert_eq!(effective_streak(&state, t + Duration::hours(30)), 4);
        assert_eq!(effective_streak(&state, t + Duration::days(2)), 0);
    }
}
