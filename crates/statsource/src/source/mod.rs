//! Log source — turning a server's log directory into applied events.
//!
//! # Architecture
//!
//! - `files.rs`: live log and backup naming, backup selection by checkpoint
//! - `reader.rs`: line reads from a file that may still be growing
//! - `watch.rs`: change notifications that cut the live-tail wait short
//! - `pipeline.rs`: seek-to-checkpoint, classification and end-of-file closing
//! - `worker.rs`: backups first, then the live tail, until cancelled

pub mod files;
pub mod pipeline;
pub mod reader;
pub mod watch;
pub mod worker;

pub use files::{BackupFile, LogLayout};
pub use pipeline::{Phase, Pipeline};
pub use reader::LineReader;
pub use watch::LogWatch;
pub use worker::{Worker, WorkerError};
