//! Config-backed checkpoints: `servers[i].last_timestamp` in the TOML file.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{CheckpointError, CheckpointStore};
use crate::conf::AppConfig;

/// Rewrites one server's `last_timestamp` in the shared config file.
///
/// Every worker holds the same `lock`, so concurrent read-modify-write
/// cycles on the file never interleave.
#[derive(Debug, Clone)]
pub struct ConfigCheckpoint {
    path: PathBuf,
    index: usize,
    lock: Arc<Mutex<()>>,
}

impl ConfigCheckpoint {
    pub fn new(path: impl Into<PathBuf>, index: usize, lock: Arc<Mutex<()>>) -> Self {
        Self {
            path: path.into(),
            index,
            lock,
        }
    }
}

impl CheckpointStore for ConfigCheckpoint {
    fn persist(&self, stamp: &str) -> Result<(), CheckpointError> {
        let _guard = self.lock.lock();
        let mut config = AppConfig::from_file(&self.path)?;
        let server = config
            .servers
            .get_mut(self.index)
            .ok_or(CheckpointError::MissingServer(self.index))?;
        server.last_timestamp = stamp.to_string();
        let server_id = server.id;
        config.write_to(&self.path)?;
        tracing::info!(server_id, checkpoint = stamp, "persisted checkpoint");
        Ok(())
    }
}
