//! Questline progression worker.
//!
//! Wraps every engine pass in a per-user critical section, persists the
//! result through a [`ProgressStore`](questline_db::ProgressStore) with an
//! optimistic version check, and publishes the resulting events on the bus.

pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod locks;
pub mod service;

pub use config::WorkerConfig;
pub use error::WorkerError;
pub use service::ProgressionService;
