//! In-memory [`ProgressStore`] used when no database is configured.
//!
//! Applies the same version check as the PostgreSQL store so the worker's
//! retry path behaves identically in both modes.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use questline_core::achievement::AchievementDefinition;
use questline_core::leaderboard::{rank_leaderboard, LeaderboardEntry, LeaderboardSort};
use questline_core::progress::UserProgressState;
use questline_core::quest::{QuestDefinition, QuestObjective};
use questline_core::streak::effective_streak;
use questline_core::types::{DbId, Timestamp};
use tokio::sync::RwLock;

use super::{joined, Catalog, ProgressStore};
use crate::error::RepoError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

struct MemoryUser {
    username: String,
    is_active: bool,
}

/// A user's copy of a quest's mutable fields.
struct QuestInstance {
    objectives: Vec<QuestObjective>,
    progress: u8,
    completed: bool,
}

#[derive(Default)]
struct Tables {
    next_user_id: DbId,
    users: BTreeMap<DbId, MemoryUser>,
    progress: BTreeMap<DbId, UserProgressState>,
    achievements: Vec<AchievementDefinition>,
    quests: Vec<QuestDefinition>,
    /// Keyed by `(quest_id, user_id)`.
    instances: BTreeMap<(DbId, DbId), QuestInstance>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog. Definitions keep the ids they were authored with.
    pub fn with_catalog(catalog: Catalog) -> Self {
        let tables = Tables {
            achievements: catalog.achievements,
            quests: catalog.quests,
            ..Tables::default()
        };
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Drop a user from leaderboards. Progress is kept.
    pub async fn deactivate_user(&self, user_id: DbId) -> bool {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&user_id) {
            Some(user) if user.is_active => {
                user.is_active = false;
                true
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressStore
// ---------------------------------------------------------------------------

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn create_user(&self, username: &str, now: Timestamp) -> Result<DbId, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == username) {
            return Err(RepoError::Duplicate("uq_users_username".to_string()));
        }

        tables.next_user_id += 1;
        let user_id = tables.next_user_id;
        tables.users.insert(
            user_id,
            MemoryUser {
                username: username.to_string(),
                is_active: true,
            },
        );
        tables
            .progress
            .insert(user_id, UserProgressState::new(user_id, now));
        Ok(user_id)
    }

    async fn load_progress(&self, user_id: DbId) -> Result<UserProgressState, RepoError> {
        let tables = self.tables.read().await;
        tables
            .progress
            .get(&user_id)
            .cloned()
            .ok_or(RepoError::NotFound {
                entity: "user_progress",
                id: user_id,
            })
    }

    async fn active_achievements(&self) -> Result<Vec<AchievementDefinition>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .achievements
            .iter()
            .filter(|a| a.is_active)
            .cloned()
            .collect())
    }

    async fn quests_for_user(&self, user_id: DbId) -> Result<Vec<QuestDefinition>, RepoError> {
        let tables = self.tables.read().await;
        let quests = tables
            .quests
            .iter()
            .map(|catalog| {
                let mut quest = catalog.clone();
                let joined: BTreeSet<DbId> = tables
                    .instances
                    .range((quest.id, DbId::MIN)..=(quest.id, DbId::MAX))
                    .map(|(&(_, uid), _)| uid)
                    .collect();
                quest.participants.user_ids.extend(joined);

                if let Some(instance) = tables.instances.get(&(quest.id, user_id)) {
                    quest.objectives = instance.objectives.clone();
                    quest.progress = instance.progress;
                    quest.completed = instance.completed;
                }
                quest
            })
            .collect();
        Ok(quests)
    }

    async fn commit(
        &self,
        state: &UserProgressState,
        quests: &[QuestDefinition],
    ) -> Result<UserProgressState, RepoError> {
        let mut tables = self.tables.write().await;

        let stored = tables
            .progress
            .get(&state.user_id)
            .ok_or(RepoError::NotFound {
                entity: "user_progress",
                id: state.user_id,
            })?;
        if stored.version != state.version {
            tracing::debug!(
                user_id = state.user_id,
                expected = state.version,
                actual = stored.version,
                "Stale progress write"
            );
            return Err(RepoError::Conflict {
                user_id: state.user_id,
                expected: state.version,
            });
        }

        for quest in joined(state.user_id, quests) {
            if tables.instances.contains_key(&(quest.id, state.user_id)) {
                continue;
            }
            let Some(max) = tables
                .quests
                .iter()
                .find(|q| q.id == quest.id)
                .and_then(|q| q.participants.max)
            else {
                continue;
            };
            let taken = tables
                .instances
                .range((quest.id, DbId::MIN)..=(quest.id, DbId::MAX))
                .count();
            if taken >= max as usize {
                tracing::debug!(
                    user_id = state.user_id,
                    quest_id = quest.id,
                    max,
                    "Quest filled before join was committed"
                );
                return Err(RepoError::Conflict {
                    user_id: state.user_id,
                    expected: state.version,
                });
            }
        }

        let mut saved = state.clone();
        saved.version += 1;
        tables.progress.insert(saved.user_id, saved.clone());

        for quest in joined(state.user_id, quests) {
            tables.instances.insert(
                (quest.id, state.user_id),
                QuestInstance {
                    objectives: quest.objectives.clone(),
                    progress: quest.progress,
                    completed: quest.completed,
                },
            );
        }

        Ok(saved)
    }

    async fn leaderboard(
        &self,
        sort: LeaderboardSort,
        limit: usize,
        now: Timestamp,
    ) -> Result<Vec<LeaderboardEntry>, RepoError> {
        let tables = self.tables.read().await;
        let entries = tables
            .users
            .iter()
            .filter(|(_, user)| user.is_active)
            .filter_map(|(id, user)| {
                tables.progress.get(id).map(|p| LeaderboardEntry {
                    rank: 0,
                    user_id: *id,
                    username: user.username.clone(),
                    level: p.level,
                    total_xp: p.total_xp,
                    streak: effective_streak(p, now),
                })
            })
            .collect();
        Ok(rank_leaderboard(entries, sort, limit))
    }
}
