//! Table module — row accumulation for a match and the flushed table.

pub mod accumulator;
pub mod cell;
pub mod schema;

use serde::Serialize;

pub use accumulator::{Accumulator, AccumulatorError, GroupId, RowKeys};
pub use cell::{Cell, Deferred, Resolve, Value};
pub use schema::{Column, ColumnKind, Schema};

/// A flushed match: one schema, every row padded to its width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub server_id: i64,
    pub match_id: i64,
    pub schema: Schema,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn column(&self, name: &str) -> impl Iterator<Item = &Value> {
        let index = self.schema.position(name);
        self.rows
            .iter()
            .filter_map(move |row| index.and_then(|i| row.get(i)))
    }

    /// Rows whose column `name` is `true`.
    pub fn rows_flagged(&self, name: &str) -> Vec<&[Value]> {
        match self.schema.position(name) {
            Some(i) => self
                .rows
                .iter()
                .filter(|row| row.get(i) == Some(&Value::Bool(true)))
                .map(Vec::as_slice)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn value(&self, row: &[Value], name: &str) -> Value {
        self.schema
            .position(name)
            .and_then(|i| row.get(i).cloned())
            .unwrap_or(Value::Null)
    }
}
