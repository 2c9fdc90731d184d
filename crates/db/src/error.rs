use questline_core::error::CoreError;
use questline_core::types::DbId;

/// Errors surfaced by [`ProgressStore`](crate::store::ProgressStore) implementations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The stored version moved on since the state was loaded.
    #[error("Stale write for user {user_id}: expected version {expected}")]
    Conflict { user_id: DbId, expected: i64 },

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// A unique constraint (`uq_*`) rejected the write.
    #[error("Duplicate value violates unique constraint: {0}")]
    Duplicate(String),

    /// A stored row could not be turned back into a core type.
    #[error("Corrupt row: {0}")]
    Corrupt(#[from] CoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepoError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Lift PostgreSQL unique violations (error code 23505) on `uq_`
    /// constraints into [`RepoError::Duplicate`].
    pub fn classify(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return Self::Duplicate(constraint.to_string());
                }
            }
        }
        Self::Database(err)
    }
}
