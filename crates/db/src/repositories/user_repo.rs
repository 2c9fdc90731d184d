//! Repository for the `users` table.

use sqlx::PgPool;
use questline_core::types::{DbId, Timestamp};

/// Provides account lookups needed by the progression layer.
///
/// Registration and authentication live outside this crate; this repo only
/// creates the row a progress record hangs off.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user together with a zeroed `user_progress` row.
    pub async fn create(pool: &PgPool, username: &str, now: Timestamp) -> Result<DbId, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user_id: DbId =
            sqlx::query_scalar("INSERT INTO users (username) VALUES ($1) RETURNING id")
                .bind(username)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query("INSERT INTO user_progress (user_id, last_activity_at) VALUES ($1, $2)")
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user_id)
    }

    /// Deactivate a user. Progress is kept but drops off leaderboards.
    pub async fn deactivate(pool: &PgPool, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_active = false WHERE id = $1 AND is_active")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
