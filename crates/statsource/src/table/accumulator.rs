//! Accumulator — columnar row groups for the active match.
//!
//! Each event kind registers a row group naming the columns it writes. All
//! groups share one schema; a row is created as wide as the schema was at
//! that moment and null-padded when the match is flushed, so groups
//! registered later never disturb rows already written.

use thiserror::Error;

use super::cell::{Cell, Resolve, Value};
use super::schema::{Column, Schema, BASE_COLUMNS, MATCH_ID, SERVER_ID};
use super::Table;

#[derive(Debug, Error)]
pub enum AccumulatorError {
    #[error("column {name} already registered as {existing:?}, not {requested:?}")]
    KindConflict {
        name: &'static str,
        existing: super::schema::ColumnKind,
        requested: super::schema::ColumnKind,
    },
    #[error("row group {group} expects {expected} cells, got {got}")]
    WidthMismatch {
        group: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("unknown row group #{0}")]
    UnknownGroup(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

/// Identity columns written into every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowKeys {
    pub server_id: i64,
    pub match_id: i64,
}

#[derive(Debug)]
struct RowGroup {
    name: &'static str,
    indices: Vec<usize>,
    rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, Copy)]
struct PendingCell {
    group: usize,
    row: usize,
    column: usize,
}

#[derive(Debug)]
pub struct Accumulator {
    schema: Schema,
    groups: Vec<RowGroup>,
    pending: Vec<PendingCell>,
    server_col: usize,
    match_col: usize,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator {
    pub fn new() -> Self {
        let mut schema = Schema::default();
        for column in BASE_COLUMNS {
            schema.push(column);
        }
        let server_col = schema.position(SERVER_ID).unwrap_or(1);
        let match_col = schema.position(MATCH_ID).unwrap_or(2);
        Self {
            schema,
            groups: Vec::new(),
            pending: Vec::new(),
            server_col,
            match_col,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Register a row group. Columns already in the schema are reused by
    /// name; a name registered with a different kind is an error.
    pub fn register(&mut self, name: &'static str, columns: &[Column]) -> Result<GroupId, AccumulatorError> {
        let mut indices = Vec::with_capacity(columns.len());
        for column in columns {
            let index = match self.schema.position(column.name) {
                Some(index) => {
                    let existing = self.schema.columns()[index].kind;
                    if existing != column.kind {
                        return Err(AccumulatorError::KindConflict {
                            name: column.name,
                            existing,
                            requested: column.kind,
                        });
                    }
                    index
                }
                None => self.schema.push(*column),
            };
            indices.push(index);
        }

        tracing::debug!(group = name, columns = indices.len(), "registered row group");
        self.groups.push(RowGroup {
            name,
            indices,
            rows: Vec::new(),
        });
        Ok(GroupId(self.groups.len() - 1))
    }

    /// Append one row. `cells` follow the group's registered column order.
    pub fn append(&mut self, group: GroupId, keys: RowKeys, cells: Vec<Cell>) -> Result<(), AccumulatorError> {
        let width = self.schema.len();
        let target = self
            .groups
            .get_mut(group.0)
            .ok_or(AccumulatorError::UnknownGroup(group.0))?;
        if cells.len() != target.indices.len() {
            return Err(AccumulatorError::WidthMismatch {
                group: target.name,
                expected: target.indices.len(),
                got: cells.len(),
            });
        }

        let mut row = vec![Cell::NULL; width];
        row[self.server_col] = keys.server_id.into();
        row[self.match_col] = keys.match_id.into();

        let row_index = target.rows.len();
        for (cell, &column) in cells.into_iter().zip(&target.indices) {
            if cell.is_pending() {
                self.pending.push(PendingCell {
                    group: group.0,
                    row: row_index,
                    column,
                });
            }
            row[column] = cell;
        }
        target.rows.push(row);
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    pub fn group_rows(&self, group: GroupId) -> usize {
        self.groups.get(group.0).map_or(0, |g| g.rows.len())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Rows of one group as they stand, without resolving or padding.
    pub fn rows(&self, group: GroupId) -> &[Vec<Cell>] {
        self.groups.get(group.0).map_or(&[][..], |g| g.rows.as_slice())
    }

    /// Resolve every deferred cell in place. Calling again is a no-op.
    pub fn resolve_pending(&mut self, resolver: &impl Resolve) {
        for PendingCell { group, row, column } in self.pending.drain(..) {
            let Some(cell) = self
                .groups
                .get_mut(group)
                .and_then(|g| g.rows.get_mut(row))
                .and_then(|r| r.get_mut(column))
            else {
                continue;
            };
            if let Cell::Pending(deferred) = cell {
                *cell = Cell::Value(deferred.resolve(resolver));
            }
        }
    }

    /// Resolve, pad, and concatenate all groups in registration order,
    /// leaving the accumulator empty.
    pub fn take_table(&mut self, keys: RowKeys, resolver: &impl Resolve) -> Table {
        self.resolve_pending(resolver);
        let width = self.schema.len();
        let mut rows = Vec::with_capacity(self.row_count());
        for group in &mut self.groups {
            for mut row in group.rows.drain(..) {
                row.resize(width, Cell::NULL);
                rows.push(row.into_iter().map(Cell::into_value).collect::<Vec<Value>>());
            }
        }
        Table {
            server_id: keys.server_id,
            match_id: keys.match_id,
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Drop all rows and pending cells; registrations are kept.
    pub fn clear(&mut self) {
        for group in &mut self.groups {
            group.rows.clear();
        }
        self.pending.clear();
    }
}
