use std::sync::Arc;

use anyhow::Context;
use questline_db::{MemoryStore, PgStore, ProgressStore};
use questline_events::{EventBus, EventPersistence};
use questline_worker::catalog::load_catalog;
use questline_worker::command::handle_line;
use questline_worker::config::LogFormat;
use questline_worker::{ProgressionService, WorkerConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = WorkerConfig::from_env()?;

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "questline_worker=debug,questline_events=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    // --- Event bus ---
    let bus = Arc::new(EventBus::new(config.event_bus_capacity));

    // --- Store ---
    let store: Arc<dyn ProgressStore> = match &config.database_url {
        Some(url) => {
            let pool = questline_db::create_pool(url, config.database_max_connections)
                .await
                .context("Failed to connect to database")?;
            questline_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            questline_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database ready, using PostgreSQL store");

            tokio::spawn(EventPersistence::run(pool.clone(), bus.subscribe()));
            Arc::new(PgStore::new(pool))
        }
        None => {
            let store = match &config.catalog_path {
                Some(path) => MemoryStore::with_catalog(
                    load_catalog(path)
                        .with_context(|| format!("Failed to load catalog {}", path.display()))?,
                ),
                None => MemoryStore::new(),
            };
            tracing::info!("DATABASE_URL not set, using in-memory store");
            Arc::new(store)
        }
    };

    let service = ProgressionService::new(store, bus, config.max_retries);
    tracing::info!(max_retries = config.max_retries, "Worker ready, reading commands from stdin");

    // --- Command loop ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = handle_line(&service, line).await;
        let mut out = serde_json::to_vec(&reply)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    tracing::info!("Input closed, worker shutting down");
    Ok(())
}
