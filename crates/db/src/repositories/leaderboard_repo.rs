//! Leaderboard queries over `users` and `user_progress`.

use questline_core::leaderboard::LeaderboardSort;
use questline_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::leaderboard::LeaderboardRow;

/// Provides top-N queries for the leaderboard.
pub struct LeaderboardRepo;

impl LeaderboardRepo {
    /// Fetch the top `limit` active users in `sort` order.
    ///
    /// The ordering matches [`questline_core::leaderboard::rank_leaderboard`]
    /// so the caller can assign ranks without re-sorting surprises. Streaks
    /// whose last activity is two or more days before `now` read as 0.
    pub async fn top(
        pool: &PgPool,
        sort: LeaderboardSort,
        limit: i64,
        now: Timestamp,
    ) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
        let order = match sort {
            LeaderboardSort::Xp => "b.level DESC, b.total_xp DESC, b.user_id ASC",
            LeaderboardSort::Streak => "b.streak DESC, b.level DESC, b.user_id ASC",
        };
        let query = format!(
            "SELECT b.user_id, b.username, b.level, b.total_xp, b.streak \
             FROM ( \
                SELECT u.id AS user_id, u.username, p.level, p.total_xp, \
                    CASE WHEN $2 - p.last_activity_at >= INTERVAL '2 days' THEN 0 \
                         ELSE p.streak END AS streak \
                FROM users u \
                JOIN user_progress p ON p.user_id = u.id \
                WHERE u.is_active \
             ) b \
             ORDER BY {order} \
             LIMIT $1"
        );
        sqlx::query_as::<_, LeaderboardRow>(&query)
            .bind(limit)
            .bind(now)
            .fetch_all(pool)
            .await
    }
}
