//! Memory — records every persisted checkpoint, for tests.

use parking_lot::Mutex;

use super::{CheckpointError, CheckpointStore};

#[derive(Debug, Default)]
pub struct MemoryCheckpoint {
    history: Mutex<Vec<String>>,
}

impl MemoryCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<String> {
        self.history.lock().last().cloned()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }
}

impl CheckpointStore for MemoryCheckpoint {
    fn persist(&self, stamp: &str) -> Result<(), CheckpointError> {
        self.history.lock().push(stamp.to_string());
        Ok(())
    }
}
