//! Memory — in-process sink for tests and dry runs.

use parking_lot::Mutex;

use super::{SinkError, TableSink};
use crate::table::Table;

#[derive(Debug, Default)]
pub struct MemorySink {
    tables: Mutex<Vec<Table>>,
    reject: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose writes all fail.
    pub fn failing() -> Self {
        Self {
            tables: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    pub fn tables(&self) -> Vec<Table> {
        self.tables.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.tables.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TableSink for MemorySink {
    fn write_table(&self, table: &Table) -> Result<(), SinkError> {
        if self.reject {
            return Err(SinkError::Rejected(table.match_id));
        }
        self.tables.lock().push(table.clone());
        Ok(())
    }
}
