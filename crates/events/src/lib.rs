//! Questline event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the event envelope, built from engine
//!   [`UnlockEvent`](questline_core::events::UnlockEvent)s.
//! - [`EventPersistence`]: background service appending every event to the
//!   `progression_events` table.

pub mod bus;
pub mod persistence;

pub use bus::{EventBus, PlatformEvent};
pub use persistence::EventPersistence;
