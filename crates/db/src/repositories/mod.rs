//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async queries that
//! accept `&PgPool` (or an open transaction) as the first argument.

pub mod achievement_repo;
pub mod leaderboard_repo;
pub mod progress_repo;
pub mod progression_event_repo;
pub mod quest_repo;
pub mod user_repo;

pub use achievement_repo::AchievementRepo;
pub use leaderboard_repo::LeaderboardRepo;
pub use progress_repo::ProgressRepo;
pub use progression_event_repo::ProgressionEventRepo;
pub use quest_repo::QuestRepo;
pub use user_repo::UserRepo;
