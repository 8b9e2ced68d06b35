//! Files — where a server keeps its live log and rotated backups.

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::conf::{AppConfig, ServerConfig};

/// Rotation stamp embedded in backup file names.
pub const BACKUP_STAMP_FORMAT: &str = "%Y.%m.%d-%H.%M.%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLayout {
    pub dir: PathBuf,
    pub live_name: String,
    pub backup_prefix: String,
}

/// A rotated log, named `<prefix><yyyy.MM.dd-HH.mm.ss>.log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub path: PathBuf,
    pub rotated_at: NaiveDateTime,
}

impl LogLayout {
    pub fn new(dir: impl Into<PathBuf>, live_name: impl Into<String>, backup_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            live_name: live_name.into(),
            backup_prefix: backup_prefix.into(),
        }
    }

    pub fn for_server(config: &AppConfig, server: &ServerConfig) -> Self {
        Self::new(
            server.log_dir(&config.log_subdir),
            config.live_log_name.clone(),
            config.backup_prefix.clone(),
        )
    }

    pub fn live_path(&self) -> PathBuf {
        self.dir.join(&self.live_name)
    }

    /// Every backup in the directory, oldest first. Files whose name does
    /// not carry a rotation stamp are ignored.
    pub async fn backups(&self) -> io::Result<Vec<BackupFile>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut backups = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            if let Some(rotated_at) = backup_timestamp(&path, &self.backup_prefix) {
                backups.push(BackupFile { path, rotated_at });
            }
        }
        backups.sort_by(|a, b| a.rotated_at.cmp(&b.rotated_at).then_with(|| a.path.cmp(&b.path)));
        Ok(backups)
    }

    /// Backups that may still hold lines after `checkpoint`.
    pub async fn pending_backups(&self, checkpoint: Option<NaiveDateTime>) -> io::Result<Vec<BackupFile>> {
        let backups = self.backups().await?;
        Ok(match checkpoint {
            Some(checkpoint) => backups
                .into_iter()
                .filter(|b| checkpoint <= b.rotated_at)
                .collect(),
            None => backups,
        })
    }
}

/// Parse the rotation stamp out of a backup file name.
pub fn backup_timestamp(path: &Path, prefix: &str) -> Option<NaiveDateTime> {
    let stem = path.file_stem()?.to_str()?;
    let stamp = stem.strip_prefix(prefix)?;
    NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP_FORMAT).ok()
}
