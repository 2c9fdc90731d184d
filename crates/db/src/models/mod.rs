//! Row structs for the progression tables.
//!
//! Each submodule contains a `FromRow` struct matching the database row and
//! the conversion into the corresponding `questline_core` type. Enum-valued
//! columns are stored as text and parsed on the way out, so a corrupt row
//! surfaces as a [`CoreError`](questline_core::error::CoreError) rather than
//! a panic.

pub mod achievement;
pub mod event;
pub mod leaderboard;
pub mod progress;
pub mod quest;
