//! PostgreSQL-backed [`ProgressStore`].

use async_trait::async_trait;
use questline_core::achievement::AchievementDefinition;
use questline_core::leaderboard::{rank_leaderboard, LeaderboardEntry, LeaderboardSort};
use questline_core::progress::UserProgressState;
use questline_core::quest::QuestDefinition;
use questline_core::types::{DbId, Timestamp};

use super::{joined, ProgressStore};
use crate::error::RepoError;
use crate::repositories::{AchievementRepo, LeaderboardRepo, ProgressRepo, QuestRepo, UserRepo};
use crate::DbPool;

pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ProgressStore for PgStore {
    async fn create_user(&self, username: &str, now: Timestamp) -> Result<DbId, RepoError> {
        UserRepo::create(&self.pool, username, now)
            .await
            .map_err(RepoError::classify)
    }

    async fn load_progress(&self, user_id: DbId) -> Result<UserProgressState, RepoError> {
        ProgressRepo::find_by_user(&self.pool, user_id)
            .await?
            .map(UserProgressState::from)
            .ok_or(RepoError::NotFound {
                entity: "user_progress",
                id: user_id,
            })
    }

    async fn active_achievements(&self) -> Result<Vec<AchievementDefinition>, RepoError> {
        let rows = AchievementRepo::list_active(&self.pool).await?;
        rows.into_iter()
            .map(|row| AchievementDefinition::try_from(row).map_err(RepoError::from))
            .collect()
    }

    async fn quests_for_user(&self, user_id: DbId) -> Result<Vec<QuestDefinition>, RepoError> {
        let rows = QuestRepo::list_for_user(&self.pool, user_id).await?;
        rows.into_iter()
            .map(|row| QuestDefinition::try_from(row).map_err(RepoError::from))
            .collect()
    }

    async fn commit(
        &self,
        state: &UserProgressState,
        quests: &[QuestDefinition],
    ) -> Result<UserProgressState, RepoError> {
        let mut tx = self.pool.begin().await?;

        let Some(version) = ProgressRepo::update_if_version(&mut tx, state).await? else {
            tx.rollback().await?;
            tracing::debug!(user_id = state.user_id, expected = state.version, "Stale progress write");
            return Err(RepoError::Conflict {
                user_id: state.user_id,
                expected: state.version,
            });
        };

        for quest in joined(state.user_id, quests) {
            if !QuestRepo::claim_slot(&mut tx, quest.id, state.user_id).await? {
                tx.rollback().await?;
                tracing::debug!(
                    user_id = state.user_id,
                    quest_id = quest.id,
                    "Quest filled before join was committed"
                );
                return Err(RepoError::Conflict {
                    user_id: state.user_id,
                    expected: state.version,
                });
            }
            QuestRepo::upsert_instance(&mut tx, state.user_id, quest).await?;
        }

        tx.commit().await?;

        let mut saved = state.clone();
        saved.version = version;
        Ok(saved)
    }

    async fn leaderboard(
        &self,
        sort: LeaderboardSort,
        limit: usize,
        now: Timestamp,
    ) -> Result<Vec<LeaderboardEntry>, RepoError> {
        let rows = LeaderboardRepo::top(&self.pool, sort, limit as i64, now).await?;
        let entries = rows.into_iter().map(LeaderboardEntry::from).collect();
        Ok(rank_leaderboard(entries, sort, limit))
    }
}
