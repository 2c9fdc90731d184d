//! Per-user critical sections.

use std::collections::HashMap;
use std::sync::Arc;

use questline_core::types::DbId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of async mutexes keyed by user id.
///
/// Holding the guard returned by [`UserLocks::acquire`] serialises every
/// load-process-commit cycle for that user within this process.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<DbId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`.
    pub async fn acquire(&self, user_id: DbId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(user_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop entries nobody is holding or waiting on.
    pub async fn prune(&self) {
        self.locks
            .lock()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
