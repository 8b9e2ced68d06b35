//! Model — AppConfig and per-server settings.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::parser::line;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog_path: String,
    pub output_dir: String,
    pub poll_interval_ms: u64,
    pub log_subdir: String,
    pub live_log_name: String,
    pub backup_prefix: String,
    pub servers: Vec<ServerConfig>,
}

/// One monitored server. `last_timestamp` is the resume checkpoint and is
/// rewritten in place as matches are flushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub id: i64,
    pub path: String,
    #[serde(default)]
    pub last_timestamp: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: "squad.json".to_string(),
            output_dir: "matchdata".to_string(),
            poll_interval_ms: 1000,
            log_subdir: "SquadGame/Saved/Logs".to_string(),
            live_log_name: "SquadGame.log".to_string(),
            backup_prefix: "SquadGame-backup-".to_string(),
            servers: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn new(id: i64, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            last_timestamp: String::new(),
        }
    }

    /// Directory holding the live log and its backups.
    pub fn log_dir(&self, subdir: &str) -> PathBuf {
        Path::new(&self.path).join(subdir)
    }

    /// Parsed checkpoint; empty or malformed means "replay everything".
    pub fn checkpoint(&self) -> Option<NaiveDateTime> {
        if self.last_timestamp.is_empty() {
            return None;
        }
        line::parse_timestamp(&self.last_timestamp)
    }
}
