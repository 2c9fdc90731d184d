//! Questline progression engine.
//!
//! Pure, I/O-free rules for XP, levels, streaks, achievements and quests.
//! Every operation takes the current state by reference and returns a new
//! state plus the [`events::UnlockEvent`]s it produced; persistence and
//! delivery belong to the `db`, `events` and `worker` crates.

pub mod achievement;
pub mod activity;
pub mod error;
pub mod events;
pub mod leaderboard;
pub mod objective;
pub mod progress;
pub mod quest;
pub mod streak;
pub mod types;
pub mod xp;
