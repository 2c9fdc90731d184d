//! Persistence for the questline progression engine.
//!
//! - [`models`]: `FromRow` row structs and their conversions into core types.
//! - [`repositories`]: zero-sized repos with async queries taking `&PgPool`.
//! - [`store`]: the [`ProgressStore`] trait the worker talks to, with a
//!   PostgreSQL-backed and an in-memory implementation.

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod models;
pub mod repositories;
pub mod store;

pub use error::RepoError;
pub use store::{MemoryStore, PgStore, ProgressStore};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the pool is usable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
