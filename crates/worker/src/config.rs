use std::path::PathBuf;
use std::str::FromStr;

use crate::error::WorkerError;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// When absent the in-memory store is used.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Extra attempts after a stale write before giving up.
    pub max_retries: u32,
    pub event_bus_capacity: usize,
    /// JSON catalog used to seed the in-memory store.
    pub catalog_path: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default  |
    /// |----------------------------|----------|
    /// | `DATABASE_URL`             | unset    |
    /// | `DATABASE_MAX_CONNECTIONS` | `10`     |
    /// | `PROGRESSION_MAX_RETRIES`  | `3`      |
    /// | `EVENT_BUS_CAPACITY`       | `1024`   |
    /// | `CATALOG_PATH`             | unset    |
    /// | `LOG_FORMAT`               | `pretty` |
    pub fn from_env() -> Result<Self, WorkerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WorkerError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let log_format = match non_empty("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(WorkerError::Config(format!(
                    "LOG_FORMAT must be 'pretty' or 'json', got '{other}'"
                )))
            }
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            database_max_connections: parse_positive_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            max_retries: parse_or(&lookup, "PROGRESSION_MAX_RETRIES", 3)?,
            event_bus_capacity: parse_positive_or(&lookup, "EVENT_BUS_CAPACITY", 1024)?,
            catalog_path: non_empty("CATALOG_PATH").map(PathBuf::from),
            log_format,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, WorkerError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| WorkerError::Config(format!("{key} must be a number, got '{raw}'"))),
    }
}

/// Like [`parse_or`] but rejects zero, for pool sizes and channel capacities.
fn parse_positive_or<T: FromStr + Default + PartialEq>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, WorkerError> {
    let value = parse_or(lookup, key, default)?;
    if value == T::default() {
        return Err(WorkerError::Config(format!("{key} must be greater than zero")));
    }
    Ok(value)
}
