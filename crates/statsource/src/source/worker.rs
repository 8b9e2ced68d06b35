//! Worker — replays a server's backups, then tails its live log.
//!
//! Lines are read on the async runtime and handed to the pipeline in
//! batches on the blocking pool, since a flush writes the table and the
//! checkpoint to disk.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use thiserror::Error;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::files::LogLayout;
use super::pipeline::Pipeline;
use super::reader::LineReader;
use super::watch::LogWatch;
use crate::events::ExtractError;

/// Lines handed to the blocking pool per batch.
const BATCH_LINES: usize = 1024;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("pipeline task failed: {0}")]
    Join(#[from] JoinError),
    #[error("pipeline was lost by an earlier failed batch")]
    PipelineLost,
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> WorkerError + '_ {
    move |source| WorkerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub struct Worker {
    server_id: i64,
    // Out only while a batch runs on the blocking pool.
    pipeline: Option<Pipeline>,
    layout: LogLayout,
    checkpoint: Option<NaiveDateTime>,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(pipeline: Pipeline, layout: LogLayout, checkpoint: Option<NaiveDateTime>, poll_interval: Duration) -> Self {
        Self {
            server_id: pipeline.context().server_id(),
            pipeline: Some(pipeline),
            layout,
            checkpoint,
            poll_interval,
        }
    }

    /// `None` once a batch panicked.
    pub fn pipeline(&self) -> Option<&Pipeline> {
        self.pipeline.as_ref()
    }

    fn server_id(&self) -> i64 {
        self.server_id
    }

    fn begin_file(&mut self, checkpoint: Option<NaiveDateTime>) -> Result<(), WorkerError> {
        self.pipeline
            .as_mut()
            .ok_or(WorkerError::PipelineLost)?
            .begin_file(checkpoint);
        Ok(())
    }

    /// Catch up on backups, then follow the live log until cancelled.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), WorkerError> {
        self.catch_up().await?;
        self.tail(cancel).await
    }

    /// Replay every backup rotated at or after the checkpoint, oldest first.
    pub async fn catch_up(&mut self) -> Result<(), WorkerError> {
        let backups = self
            .layout
            .pending_backups(self.checkpoint)
            .await
            .map_err(io_error(&self.layout.dir))?;
        info!(server_id = self.server_id(), backups = backups.len(), "replaying backups");

        for backup in backups {
            debug!(server_id = self.server_id(), path = %backup.path.display(), "replaying backup");
            let mut reader = LineReader::open(&backup.path)
                .await
                .map_err(io_error(&backup.path))?;
            self.begin_file(self.checkpoint)?;
            self.drain(&mut reader).await?;
            self.close_file(&mut reader).await?;
        }
        Ok(())
    }

    /// Follow the live log. Cancellation leaves the open match unflushed so
    /// the next run replays it from the last checkpoint.
    pub async fn tail(&mut self, cancel: CancellationToken) -> Result<(), WorkerError> {
        let live = self.layout.live_path();
        let mut reader = LineReader::open(&live).await.map_err(io_error(&live))?;
        self.begin_file(self.checkpoint)?;
        let mut watch = LogWatch::new(&self.layout.dir, &self.layout.live_name);
        info!(server_id = self.server_id(), path = %live.display(), "tailing live log");

        loop {
            self.drain(&mut reader).await?;

            if reader.is_truncated().await.map_err(io_error(&live))? {
                // Rotated: whatever the old handle still holds belongs to
                // the previous server run.
                warn!(server_id = self.server_id(), "live log rotated, reopening");
                self.drain(&mut reader).await?;
                self.close_file(&mut reader).await?;
                reader = LineReader::open(&live).await.map_err(io_error(&live))?;
                self.begin_file(None)?;
                continue;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(server_id = self.server_id(), "worker stopping");
                    return Ok(());
                }
                _ = watch.wait(self.poll_interval) => {}
            }
        }
    }

    /// Feed every complete line the reader has, batch by batch.
    async fn drain(&mut self, reader: &mut LineReader) -> Result<(), WorkerError> {
        loop {
            let mut batch = Vec::with_capacity(BATCH_LINES);
            while batch.len() < BATCH_LINES {
                let next = reader.next_line().await.map_err(|source| WorkerError::Io {
                    path: reader.path().to_path_buf(),
                    source,
                })?;
                match next {
                    Some(line) => batch.push(line),
                    None => break,
                }
            }
            let exhausted = batch.len() < BATCH_LINES;
            self.apply(batch, false).await?;
            if exhausted {
                return Ok(());
            }
        }
    }

    /// Feed the unterminated tail, if any, and close the file.
    async fn close_file(&mut self, reader: &mut LineReader) -> Result<(), WorkerError> {
        let last = reader.take_partial().into_iter().collect();
        self.apply(last, true).await
    }

    async fn apply(&mut self, lines: Vec<String>, end_of_file: bool) -> Result<(), WorkerError> {
        if lines.is_empty() && !end_of_file {
            return Ok(());
        }
        let mut pipeline = self.pipeline.take().ok_or(WorkerError::PipelineLost)?;
        let (pipeline, result) = tokio::task::spawn_blocking(move || {
            let mut result = lines.iter().try_for_each(|line| pipeline.ingest(line));
            if result.is_ok() && end_of_file {
                result = pipeline.end_of_file();
            }
            (pipeline, result)
        })
        .await?;
        self.pipeline = Some(pipeline);
        Ok(result?)
    }
}
