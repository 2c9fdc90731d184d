//! Durable event persistence service.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and appends every [`PlatformEvent`] to `progression_events`. It runs as a
//! long-lived background task and exits when the bus is dropped.

use questline_core::types::DbId;
use questline_db::repositories::ProgressionEventRepo;
use questline_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::PlatformEvent;

/// Background service that persists progression events to the database.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop until the channel is closed.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let Some(user_id) = event.actor_user_id else {
                        tracing::warn!(
                            event_type = %event.event_type,
                            "Event has no actor, not persisted"
                        );
                        continue;
                    };
                    if let Err(e) = Self::persist(&pool, user_id, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            user_id,
                            "Failed to persist event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    async fn persist(
        pool: &DbPool,
        user_id: DbId,
        event: &PlatformEvent,
    ) -> Result<DbId, sqlx::Error> {
        ProgressionEventRepo::insert(
            pool,
            user_id,
            &event.event_type,
            event.source_entity_type.as_deref(),
            event.source_entity_id,
            &event.payload,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use questline_core::events::UnlockEvent;
    use questline_db::repositories::UserRepo;

    use super::*;
    use crate::bus::EventBus;

    #[sqlx::test(migrations = "../db/migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn persists_events_until_bus_closes(pool: DbPool) {
        let user_id = UserRepo::create(&pool, "ada", Utc::now()).await.unwrap();

        let bus = EventBus::default();
        let handle = tokio::spawn(EventPersistence::run(pool.clone(), bus.subscribe()));

        bus.publish(PlatformEvent::new("progression.orphan"));
        bus.publish(
            PlatformEvent::from_unlock(
                user_id,
                &UnlockEvent::QuestCompleted {
                    quest_id: 5,
                    xp_awarded: 30,
                },
                Utc::now(),
            )
            .unwrap(),
        );
        drop(bus);
        handle.await.unwrap();

        let rows = ProgressionEventRepo::list_for_user(&pool, user_id, 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_type, "progression.quest_completed");
        assert_eq!(rows[0].source_entity_type.as_deref(), Some("quest"));
        assert_eq!(rows[0].payload["xp_awarded"], 30);
    }
}
