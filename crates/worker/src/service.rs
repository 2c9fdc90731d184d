//! The progression service: one engine pass per activity, serialised per user.

use std::sync::Arc;

use questline_core::activity::{process_activity, Activity, ProgressionOutcome};
use questline_core::events::UnlockEvent;
use questline_core::leaderboard::{clamp_limit, LeaderboardEntry, LeaderboardSort};
use questline_core::types::{DbId, Timestamp};
use questline_db::ProgressStore;
use questline_events::{EventBus, PlatformEvent};

use crate::error::WorkerError;
use crate::locks::UserLocks;

/// Default number of extra attempts after a stale write.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

pub struct ProgressionService {
    store: Arc<dyn ProgressStore>,
    bus: Arc<EventBus>,
    locks: UserLocks,
    max_retries: u32,
}

impl ProgressionService {
    pub fn new(store: Arc<dyn ProgressStore>, bus: Arc<EventBus>, max_retries: u32) -> Self {
        Self {
            store,
            bus,
            locks: UserLocks::new(),
            max_retries,
        }
    }

    pub fn store(&self) -> &Arc<dyn ProgressStore> {
        &self.store
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub async fn register(&self, username: &str, now: Timestamp) -> Result<DbId, WorkerError> {
        let user_id = self.store.create_user(username, now).await?;
        tracing::info!(user_id, username, "User registered");
        Ok(user_id)
    }

    /// Apply one activity for `user_id` and publish the resulting events.
    ///
    /// Nothing is published unless the new state was committed.
    pub async fn process(
        &self,
        user_id: DbId,
        activity: &Activity,
        now: Timestamp,
    ) -> Result<ProgressionOutcome, WorkerError> {
        let guard = self.locks.acquire(user_id).await;
        let result = self.process_locked(user_id, activity, now).await;
        drop(guard);
        self.locks.prune().await;

        let outcome = result?;
        tracing::info!(
            user_id,
            activity = activity.name(),
            level = outcome.state.level,
            total_xp = outcome.state.total_xp,
            events = outcome.events.len(),
            "Activity processed"
        );
        self.publish(user_id, &outcome.events, now);
        Ok(outcome)
    }

    async fn process_locked(
        &self,
        user_id: DbId,
        activity: &Activity,
        now: Timestamp,
    ) -> Result<ProgressionOutcome, WorkerError> {
        let mut attempts = 0;
        loop {
            attempts += 1;

            let state = self.store.load_progress(user_id).await?;
            let achievements = self.store.active_achievements().await?;
            let quests = self.store.quests_for_user(user_id).await?;

            let outcome = process_activity(&state, activity, now, &achievements, &quests)?;

            match self.store.commit(&outcome.state, &outcome.quests).await {
                Ok(saved) => {
                    return Ok(ProgressionOutcome {
                        state: saved,
                        ..outcome
                    })
                }
                Err(e) if e.is_conflict() && attempts <= self.max_retries => {
                    tracing::warn!(user_id, attempts, "Progress write conflicted, retrying");
                }
                Err(e) if e.is_conflict() => {
                    tracing::error!(user_id, attempts, "Progress write conflicted, giving up");
                    return Err(WorkerError::RetriesExhausted { user_id, attempts });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Ranked board with streaks as they stand at `now`.
    pub async fn leaderboard(
        &self,
        sort: LeaderboardSort,
        limit: Option<usize>,
        now: Timestamp,
    ) -> Result<Vec<LeaderboardEntry>, WorkerError> {
        Ok(self.store.leaderboard(sort, clamp_limit(limit), now).await?)
    }

    fn publish(&self, user_id: DbId, events: &[UnlockEvent], now: Timestamp) {
        for event in events {
            match PlatformEvent::from_unlock(user_id, event, now) {
                Ok(platform) => self.bus.publish(platform),
                Err(e) => tracing::error!(
                    error = %e,
                    event_type = event.event_type(),
                    "Failed to encode progression event"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};
    use questline_core::achievement::{AchievementCategory, AchievementDefinition, Rarity, Tier};
    use questline_core::error::CoreError;
    use questline_core::events::{EVENT_ACHIEVEMENT_UNLOCKED, EVENT_LEVEL_UP, EVENT_XP_GRANTED};
    use questline_core::objective::{Criteria, TYPE_LESSONS_COMPLETED};
    use questline_db::store::Catalog;
    use questline_db::{MemoryStore, RepoError};

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
    }

    fn lesson(xp_reward: i64) -> Activity {
        Activity::LessonCompleted {
            subject: "math".to_string(),
            xp_reward,
            time_spent: 10,
            score: None,
        }
    }

    fn service_with(catalog: Catalog) -> ProgressionService {
        ProgressionService::new(
            Arc::new(MemoryStore::with_catalog(catalog)),
            Arc::new(EventBus::default()),
            DEFAULT_MAX_RETRIES,
        )
    }

    #[tokio::test]
    async fn process_commits_and_publishes() {
        let service = service_with(Catalog {
            achievements: vec![AchievementDefinition {
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
            }],
            quests: Vec::new(),
        });
        let mut rx = service.bus().subscribe();
        let user = service.register("ada", now()).await.unwrap();

        let outcome = service.process(user, &lesson(60), now()).await.unwrap();
        assert_eq!(outcome.state.total_xp, 110);
        assert_eq!(outcome.state.level, 2);
        assert_eq!(outcome.state.version, 1);
        assert!(outcome.leveled_up());

        let stored = service.store().load_progress(user).await.unwrap();
        assert_eq!(stored, outcome.state);

        let mut types = Vec::new();
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event.actor_user_id, Some(user));
            types.push(event.event_type);
        }
        assert_eq!(
            types,
            vec![
                EVENT_XP_GRANTED,
                EVENT_ACHIEVEMENT_UNLOCKED,
                EVENT_XP_GRANTED,
                EVENT_LEVEL_UP
            ]
        );
    }

    #[tokio::test]
    async fn engine_errors_leave_state_untouched() {
        let service = service_with(Catalog::default());
        let mut rx = service.bus().subscribe();
        let user = service.register("ada", now()).await.unwrap();

        let err = service
            .process(user, &lesson(10), now() - Duration::days(1))
            .await
            .unwrap_err();
        assert_matches!(err, WorkerError::Core(CoreError::ClockSkew { .. }));

        let stored = service.store().load_progress(user).await.unwrap();
        assert_eq!(stored.version, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unknown_user_is_a_repo_error() {
        let service = service_with(Catalog::default());
        let err = service.process(99, &lesson(10), now()).await.unwrap_err();
        assert_matches!(err, WorkerError::Repo(RepoError::NotFound { id: 99, .. }));
    }

    #[tokio::test]
    async fn leaderboard_limit_is_clamped() {
        let service = service_with(Catalog::default());
        for name in ["ada", "bob", "cy"] {
            service.register(name, now()).await.unwrap();
        }
        let board = service
            .leaderboard(LeaderboardSort::Xp, Some(0), now())
            .await
            .unwrap();
        assert_eq!(board.len(), 1);
    }
}
