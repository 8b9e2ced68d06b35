//! Schema — typed columns shared by every row group of a match.

use serde::Serialize;

pub const TIMESTAMP: &str = "timestamp";
pub const SERVER_ID: &str = "server_id";
pub const MATCH_ID: &str = "match_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Timestamp,
    Int64,
    Float,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn timestamp(name: &'static str) -> Self {
        Self { name, kind: ColumnKind::Timestamp }
    }

    pub const fn int(name: &'static str) -> Self {
        Self { name, kind: ColumnKind::Int64 }
    }

    pub const fn float(name: &'static str) -> Self {
        Self { name, kind: ColumnKind::Float }
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self { name, kind: ColumnKind::Boolean }
    }
}

/// Columns every row carries, filled in by the accumulator.
pub const BASE_COLUMNS: [Column; 3] = [
    Column::timestamp(TIMESTAMP),
    Column::int(SERVER_ID),
    Column::int(MATCH_ID),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub(crate) fn push(&mut self, column: Column) -> usize {
        self.columns.push(column);
        self.columns.len() - 1
    }
}
