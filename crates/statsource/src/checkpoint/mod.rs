//! Checkpoint — durable resume positions.
//!
//! A checkpoint is the literal timestamp of the last line whose effects are
//! durably handed off. Workers only persist after a successful flush.

pub mod config;
pub mod memory;

use thiserror::Error;

use crate::conf::ConfigError;

pub use config::ConfigCheckpoint;
pub use memory::MemoryCheckpoint;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no server at index {0} in the config file")]
    MissingServer(usize),
}

pub trait CheckpointStore: Send + Sync {
    fn persist(&self, stamp: &str) -> Result<(), CheckpointError>;
}
