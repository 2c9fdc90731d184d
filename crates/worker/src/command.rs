//! Line-delimited JSON commands read by the worker binary.
//!
//! ```text
//! {"command":"register","username":"ada"}
//! {"command":"activity","user_id":1,"activity":{"type":"login"}}
//! {"command":"leaderboard","sort":"streak","limit":5}
//! ```

use chrono::Utc;
use questline_core::activity::Activity;
use questline_core::events::UnlockEvent;
use questline_core::leaderboard::{LeaderboardEntry, LeaderboardSort};
use questline_core::types::{DbId, Timestamp, Xp};
use serde::{Deserialize, Serialize};

use crate::error::WorkerError;
use crate::service::ProgressionService;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Register {
        username: String,
    },
    Activity {
        user_id: DbId,
        activity: Activity,
        /// Defaults to the time the line is handled.
        #[serde(default)]
        at: Option<Timestamp>,
    },
    Leaderboard {
        #[serde(default)]
        sort: LeaderboardSort,
        #[serde(default)]
        limit: Option<usize>,
        /// Defaults to the time the line is handled.
        #[serde(default)]
        at: Option<Timestamp>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    Registered {
        user_id: DbId,
    },
    Progressed {
        user_id: DbId,
        level: i32,
        total_xp: Xp,
        xp_in_level: Xp,
        streak: i32,
        events: Vec<UnlockEvent>,
    },
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
    },
    Error {
        message: String,
    },
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, WorkerError> {
        Ok(serde_json::from_str(line)?)
    }
}

/// Run one command against the service.
pub async fn dispatch(service: &ProgressionService, command: Command) -> Result<Reply, WorkerError> {
    match command {
        Command::Register { username } => {
            let user_id = service.register(&username, Utc::now()).await?;
            Ok(Reply::Registered { user_id })
        }
        Command::Activity {
            user_id,
            activity,
            at,
        } => {
            let outcome = service
                .process(user_id, &activity, at.unwrap_or_else(Utc::now))
                .await?;
            Ok(Reply::Progressed {
                user_id,
                level: outcome.state.level,
                total_xp: outcome.state.total_xp,
                xp_in_level: outcome.state.xp_in_level,
                streak: outcome.state.streak,
                events: outcome.events,
            })
        }
        Command::Leaderboard { sort, limit, at } => {
            let entries = service
                .leaderboard(sort, limit, at.unwrap_or_else(Utc::now))
                .await?;
            Ok(Reply::Leaderboard { entries })
        }
    }
}

/// Parse and run a single input line. Failures become [`Reply::Error`].
pub async fn handle_line(service: &ProgressionService, line: &str) -> Reply {
    let result = match Command::parse(line) {
        Ok(command) => dispatch(service, command).await,
        Err(e) => Err(e),
    };
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Command failed");
        Reply::Error {
            message: e.to_string(),
        }
    })
}
