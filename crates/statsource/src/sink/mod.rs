//! Sink trait — where flushed match tables are handed off.
//!
//! Workers call the sink from the flush path, on tokio's blocking pool, and
//! only move the checkpoint once `write_table` has returned `Ok`.
//! `json.rs` writes one file per match; `memory.rs` provides a test double.

pub mod json;
pub mod memory;

use std::path::PathBuf;

use thiserror::Error;

use crate::table::Table;

pub use json::JsonTableSink;
pub use memory::MemorySink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode table: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("sink rejected table for match {0}")]
    Rejected(i64),
}

/// Durable hand-off for flushed tables.
///
/// Shared by every worker, so implementations must tolerate concurrent calls.
pub trait TableSink: Send + Sync {
    fn write_table(&self, table: &Table) -> Result<(), SinkError>;
}
