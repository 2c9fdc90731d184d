//! Leaderboard projection over `users` joined with `user_progress`.

use questline_core::leaderboard::LeaderboardEntry;
use questline_core::types::{DbId, Xp};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeaderboardRow {
    pub user_id: DbId,
    pub username: String,
    pub level: i32,
    pub total_xp: Xp,
    pub streak: i32,
}

impl From<LeaderboardRow> for LeaderboardEntry {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            rank: 0,
            user_id: row.user_id,
            username: row.username,
            level: row.level,
            total_xp: row.total_xp,
            streak: row.streak,
        }
    }
}
