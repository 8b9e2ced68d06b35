//! Pipeline — classify and apply lines for one server, one file at a time.
//!
//! A file opened with a checkpoint starts in [`Phase::Seeking`]: lines at or
//! before the checkpoint only rebuild who is connected, and the first line
//! past it switches to full processing.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::events::{dispatch, lifecycle, Context, ExtractError};
use crate::parser::{line, Classifier, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Seeking(NaiveDateTime),
    Full,
}

pub struct Pipeline {
    ctx: Context,
    classifier: Classifier,
    phase: Phase,
    last_line: Option<(String, NaiveDateTime)>,
}

impl Pipeline {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            classifier: Classifier::new(),
            phase: Phase::Full,
            last_line: None,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Start a file, seeking past `checkpoint` when there is one.
    pub fn begin_file(&mut self, checkpoint: Option<NaiveDateTime>) {
        self.phase = checkpoint.map_or(Phase::Full, Phase::Seeking);
        self.last_line = None;
    }

    pub fn ingest(&mut self, text: &str) -> Result<(), ExtractError> {
        if !line::is_candidate(text) {
            return Ok(());
        }
        let stamped = line::stamp(text).and_then(|stamp| Some((stamp, line::parse_timestamp(stamp)?)));

        if let Phase::Seeking(checkpoint) = self.phase {
            let Some((_, at)) = stamped else {
                return Ok(());
            };
            if at <= checkpoint {
                return self.classify(text, &EventKind::CATCH_UP);
            }
            info!(
                server_id = self.ctx.server_id(),
                checkpoint = %checkpoint,
                resumed_at = %at,
                connected = self.ctx.session.connected_count(),
                "caught up to checkpoint"
            );
            self.ctx.accumulator.clear();
            self.phase = Phase::Full;
        }

        if let Some((stamp, at)) = stamped {
            self.last_line = Some((stamp.to_string(), at));
        }
        self.classify(text, &EventKind::ALL)
    }

    /// The file is finished: apply the open candidate, then close the server
    /// at the last stamped line. A file that never got past the checkpoint
    /// only forgets its players, which the earlier run already flushed.
    pub fn end_of_file(&mut self) -> Result<(), ExtractError> {
        if let Some(done) = self.classifier.finish() {
            dispatch(done.kind, &done.text, &mut self.ctx)?;
        }

        match self.phase {
            Phase::Full => {
                if let Some((stamp, at)) = self.last_line.take() {
                    lifecycle::server_closed(&stamp, at, &mut self.ctx)?;
                }
            }
            Phase::Seeking(_) => {
                debug!(server_id = self.ctx.server_id(), "file ended before the checkpoint");
                self.ctx.session.clear_connected();
                self.ctx.session.clear_transition_joins();
            }
        }
        Ok(())
    }

    fn classify(&mut self, text: &str, kinds: &[EventKind]) -> Result<(), ExtractError> {
        match self.classifier.feed(text, kinds) {
            Some(done) => dispatch(done.kind, &done.text, &mut self.ctx),
            None => Ok(()),
        }
    }
}
