use questline_core::error::CoreError;
use questline_core::types::DbId;
use questline_db::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    /// Every attempt lost the version race.
    #[error("Gave up on user {user_id} after {attempts} conflicting writes")]
    RetriesExhausted { user_id: DbId, attempts: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
