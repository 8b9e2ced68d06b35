//! Context — everything one worker's extractors read and mutate.

use std::sync::Arc;

use tracing::{debug, info, trace};

use super::groups::Groups;
use super::ExtractError;
use crate::checkpoint::CheckpointStore;
use crate::registry::{EntityKind, Registry};
use crate::session::{Match, Session, Side};
use crate::sink::TableSink;
use crate::table::{Accumulator, AccumulatorError, Cell, GroupId, Resolve, RowKeys};

/// Per-worker state. Nothing in here is shared with other workers except
/// the sink and the checkpoint store, which are safe for concurrent use.
pub struct Context {
    pub registry: Registry,
    pub session: Session,
    pub accumulator: Accumulator,
    pub groups: Groups,
    sink: Arc<dyn TableSink>,
    checkpoint: Arc<dyn CheckpointStore>,
    staged_checkpoint: Option<String>,
}

struct FlushResolver<'a> {
    current: &'a Match,
    registry: &'a Registry,
}

impl Resolve for FlushResolver<'_> {
    fn match_side(&self, side: Side) -> Option<i64> {
        self.current.side(side)
    }

    fn entity_id(&self, kind: EntityKind, name: &str) -> i64 {
        self.registry.resolve(name, kind)
    }
}

impl Context {
    pub fn new(
        server_id: i64,
        registry: Registry,
        sink: Arc<dyn TableSink>,
        checkpoint: Arc<dyn CheckpointStore>,
    ) -> Result<Self, AccumulatorError> {
        let mut accumulator = Accumulator::new();
        let groups = Groups::register(&mut accumulator)?;
        Ok(Self {
            registry,
            session: Session::new(server_id),
            accumulator,
            groups,
            sink,
            checkpoint,
            staged_checkpoint: None,
        })
    }

    pub fn server_id(&self) -> i64 {
        self.session.server_id
    }

    /// Append a row to the active match. Rows arriving with no match, or
    /// after the match has ended, are dropped.
    pub fn record(&mut self, group: GroupId, cells: Vec<Cell>, significant: bool) -> Result<(), ExtractError> {
        match self.session.current_match.as_ref() {
            Some(current) if current.is_ended() => {
                trace!(match_id = current.id, "match already ended, row dropped");
                Ok(())
            }
            _ => self.record_closing(group, cells, significant),
        }
    }

    /// Like [`record`](Self::record), but also accepted after match end.
    pub fn record_closing(&mut self, group: GroupId, cells: Vec<Cell>, significant: bool) -> Result<(), ExtractError> {
        let Some(current) = self.session.current_match.as_mut() else {
            trace!("no active match, row dropped");
            return Ok(());
        };
        let keys = RowKeys {
            server_id: self.session.server_id,
            match_id: current.id,
        };
        self.accumulator.append(group, keys, cells)?;
        if significant {
            current.valid = true;
        }
        Ok(())
    }

    /// Remember a checkpoint to persist once the current match is flushed.
    pub fn stage_checkpoint(&mut self, stamp: &str) {
        self.staged_checkpoint = Some(stamp.to_string());
    }

    pub fn staged_checkpoint(&self) -> Option<&str> {
        self.staged_checkpoint.as_deref()
    }

    /// Flush the active match, then persist any staged checkpoint.
    ///
    /// The checkpoint only moves after the sink accepted the table, so a
    /// crash in between replays the match instead of skipping it.
    pub fn flush(&mut self) -> Result<(), ExtractError> {
        if let Some(current) = self.session.current_match.take() {
            let keys = RowKeys {
                server_id: self.session.server_id,
                match_id: current.id,
            };
            let resolver = FlushResolver {
                current: &current,
                registry: &self.registry,
            };
            let table = self.accumulator.take_table(keys, &resolver);

            if current.valid {
                self.sink.write_table(&table)?;
                info!(
                    server_id = keys.server_id,
                    match_id = keys.match_id,
                    rows = table.rows.len(),
                    "flushed match"
                );
            } else {
                debug!(
                    server_id = keys.server_id,
                    match_id = keys.match_id,
                    rows = table.rows.len(),
                    "match had no significant events, discarded"
                );
            }
        }

        if let Some(stamp) = self.staged_checkpoint.take() {
            self.checkpoint.persist(&stamp)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, context};

    #[test]
    fn test_rows_without_match_are_dropped() {
        let (mut ctx, _, _) = context();
        let group = ctx.groups.join;
        ctx.record(group, vec![at(0).into(), 1i64.into(), true.into()], false).unwrap();
        assert_eq!(ctx.accumulator.row_count(), 0);
    }

    #[test]
    fn test_rows_after_match_end_need_record_closing() {
        let (mut ctx, _, _) = context();
        let mut current = Match::new(1, "x", at(0));
        current.finish(at(10));
        ctx.session.current_match = Some(current);

        let group = ctx.groups.join;
        ctx.record(group, vec![at(11).into(), 1i64.into(), true.into()], false).unwrap();
        assert_eq!(ctx.accumulator.row_count(), 0);

        let group = ctx.groups.server_closed;
        let cells = vec![at(12).into(), Cell::NULL, Cell::NULL, true.into()];
        ctx.record_closing(group, cells, false).unwrap();
        assert_eq!(ctx.accumulator.row_count(), 1);
    }

    #[test]
    fn test_invalid_match_is_not_written_but_checkpoint_moves() {
        let (mut ctx, sink, checkpoint) = context();
        ctx.session.current_match = Some(Match::new(1, "x", at(0)));
        let group = ctx.groups.join;
        ctx.record(group, vec![at(1).into(), 1i64.into(), true.into()], false).unwrap();
        ctx.stage_checkpoint("2019.08.01-12.00.00:000");

        ctx.flush().unwrap();
        assert!(sink.is_empty());
        assert_eq!(ctx.accumulator.row_count(), 0);
        assert!(ctx.session.current_match.is_none());
        assert_eq!(checkpoint.latest().as_deref(), Some("2019.08.01-12.00.00:000"));
    }

    #[test]
    fn test_sink_failure_keeps_checkpoint() {
        let (mut ctx, _, checkpoint) = crate::testing::context_with_sink(Arc::new(crate::sink::MemorySink::failing()));
        ctx.session.current_match = Some(Match::new(1, "x", at(0)));
        let group = ctx.groups.kill;
        let cells = vec![at(1).into(), 1i64.into(), 2i64.into(), Cell::NULL, Cell::NULL, Cell::NULL, true.into()];
        ctx.record(group, cells, true).unwrap();
        ctx.stage_checkpoint("2019.08.01-12.00.00:000");

        assert!(matches!(ctx.flush(), Err(ExtractError::Sink(_))));
        assert!(checkpoint.latest().is_none());
    }
}
