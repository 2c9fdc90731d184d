//! Leaderboard ranking.
//!
//! The database layer fetches candidate rows; ranking itself is pure so the
//! in-memory repository and the SQL-backed one order users identically.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Xp};

/// Default number of entries returned when the caller gives no limit.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// Hard cap on leaderboard size.
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardSort {
    /// Level desc, then total XP desc.
    #[default]
    Xp,
    /// Streak desc, then level desc.
    Streak,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: DbId,
    pub username: String,
    pub level: i32,
    pub total_xp: Xp,
    pub streak: i32,
}

/// Clamp a requested limit into `1..=MAX_LEADERBOARD_LIMIT`.
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT)
}

/// Sort, truncate and assign 1-based ranks.
///
/// Ties on the sort keys fall back to ascending user id.
pub fn rank_leaderboard(
    mut entries: Vec<LeaderboardEntry>,
    sort: LeaderboardSort,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        let primary = match sort {
            LeaderboardSort::Xp => b.level.cmp(&a.level).then(b.total_xp.cmp(&a.total_xp)),
            LeaderboardSort::Streak => b.streak.cmp(&a.streak).then(b.level.cmp(&a.level)),
        };
        primary.then(a.user_id.cmp(&b.user_id))
    });
    entries.truncate(limit);
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user_id: DbId, level: i32, total_xp: Xp, streak: i32) -> LeaderboardEntry {
        LeaderboardEntry {
            rank: 0,
            user_id,
            username: format!("user{user_id}"),
            level,
            total_xp,
            streak,
        }
    }

    #[test]
    fn ranks_by_level_then_xp() {
        let ranked = rank_leaderboard(
            vec![entry(1, 2, 150, 9), entry(2, 3, 210, 0), entry(3, 2, 190, 1)],
            LeaderboardSort::Xp,
            10,
        );
        let ids: Vec<DbId> = ranked.iter().map(|e| e.user_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn ranks_by_streak() {
        let ranked = rank_leaderboard(
            vec![entry(1, 2, 150, 9), entry(2, 3, 210, 0), entry(3, 5, 490, 9)],
            LeaderboardSort::Streak,
            10,
        );
        let ids: Vec<DbId> = ranked.iter().map(|e| e.user_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn ties_break_on_user_id_and_limit_applies() {
        let ranked = rank_leaderboard(
            vec![entry(9, 1, 10, 0), entry(4, 1, 10, 0), entry(6, 1, 10, 0)],
            LeaderboardSort::Xp,
            2,
        );
        let ids: Vec<DbId> = ranked.iter().map(|e| e.user_id).collect();
        assert_eq!(ids, vec![4, 6]);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None), DEFAULT_LEADERBOARD_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(5_000)), MAX_LEADERBOARD_LIMIT);
    }
}
