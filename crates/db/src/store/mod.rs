//! The storage seam between the progression worker and a backing store.
//!
//! [`ProgressStore`] is chosen once at process start: [`PgStore`] when a
//! database is configured, [`MemoryStore`] otherwise. Callers never branch on
//! which one they hold.

use async_trait::async_trait;
use questline_core::achievement::{validate_definition, AchievementDefinition};
use questline_core::error::CoreError;
use questline_core::leaderboard::{LeaderboardEntry, LeaderboardSort};
use questline_core::progress::UserProgressState;
use questline_core::quest::{validate_quest, QuestDefinition};
use questline_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::RepoError;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Register a user with a zeroed progress record.
    async fn create_user(&self, username: &str, now: Timestamp) -> Result<DbId, RepoError>;

    /// Load a user's state. Fails with [`RepoError::NotFound`] for unknown users.
    async fn load_progress(&self, user_id: DbId) -> Result<UserProgressState, RepoError>;

    /// Active achievement definitions in catalog order.
    async fn active_achievements(&self) -> Result<Vec<AchievementDefinition>, RepoError>;

    /// Active quests overlaid with the user's own instance progress.
    async fn quests_for_user(&self, user_id: DbId) -> Result<Vec<QuestDefinition>, RepoError>;

    /// Atomically persist a state and the quests the user participates in.
    ///
    /// The write only succeeds if the stored version still equals
    /// `state.version`; otherwise [`RepoError::Conflict`] is returned and
    /// nothing is written. A quest the user joins in this commit must still
    /// have a free participant slot; when another user took the last one the
    /// commit also fails with [`RepoError::Conflict`] so the caller reloads
    /// and re-evaluates. On success the returned state carries the bumped
    /// version.
    async fn commit(
        &self,
        state: &UserProgressState,
        quests: &[QuestDefinition],
    ) -> Result<UserProgressState, RepoError>;

    /// Ranked leaderboard of active users.
    ///
    /// Streaks are reported as they stand at `now`: a streak whose last
    /// activity is two or more days old reads 0.
    async fn leaderboard(
        &self,
        sort: LeaderboardSort,
        limit: usize,
        now: Timestamp,
    ) -> Result<Vec<LeaderboardEntry>, RepoError>;
}

/// Achievement and quest definitions loaded from a seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub achievements: Vec<AchievementDefinition>,
    #[serde(default)]
    pub quests: Vec<QuestDefinition>,
}

impl Catalog {
    /// Run authoring-time validation on every definition.
    pub fn validate(&self) -> Result<(), CoreError> {
        for def in &self.achievements {
            validate_definition(def)?;
        }
        for quest in &self.quests {
            validate_quest(quest)?;
        }
        Ok(())
    }
}

/// Only quests the user has joined are worth writing back.
pub(crate) fn joined<'a>(
    user_id: DbId,
    quests: &'a [QuestDefinition],
) -> impl Iterator<Item = &'a QuestDefinition> {
    quests
        .iter()
        .filter(move |q| q.participants.user_ids.contains(&user_id))
}
