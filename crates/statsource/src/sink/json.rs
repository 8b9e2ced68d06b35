//! Json — one `<match_id>.json` file per flushed match.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use super::{SinkError, TableSink};
use crate::table::Table;

/// Writes each table atomically: a temp file in the output directory is
/// synced and then renamed over the final name.
#[derive(Debug, Clone)]
pub struct JsonTableSink {
    dir: PathBuf,
}

impl JsonTableSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| SinkError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, match_id: i64) -> PathBuf {
        self.dir.join(format!("{match_id}.json"))
    }
}

impl TableSink for JsonTableSink {
    fn write_table(&self, table: &Table) -> Result<(), SinkError> {
        let path = self.path_for(table.match_id);
        let io_err = |source| SinkError::Io {
            path: path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, table)?;
            writer.flush().map_err(io_err)?;
        }
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        info!(
            server_id = table.server_id,
            match_id = table.match_id,
            rows = table.rows.len(),
            path = %path.display(),
            "wrote match table"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Accumulator, Column, Resolve, RowKeys};
    use crate::registry::EntityKind;
    use crate::session::Side;

    struct NoSides;

    impl Resolve for NoSides {
        fn match_side(&self, _side: Side) -> Option<i64> {
            None
        }
        fn entity_id(&self, _kind: EntityKind, name: &str) -> i64 {
            crate::registry::entity_id(name)
        }
    }

    fn sample_table() -> Table {
        let keys = RowKeys { server_id: 3, match_id: 42 };
        let mut acc = Accumulator::new();
        let g = acc.register("join", &[Column::int("player_id"), Column::boolean("player_joined")]).unwrap();
        acc.append(g, keys, vec![111i64.into(), true.into()]).unwrap();
        acc.take_table(keys, &NoSides)
    }

    #[test]
    fn test_writes_one_file_per_match() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonTableSink::new(dir.path().join("out")).unwrap();
        sink.write_table(&sample_table()).unwrap();

        let written = std::fs::read_to_string(sink.path_for(42)).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(doc["match_id"], 42);
        assert_eq!(doc["server_id"], 3);
        assert_eq!(doc["schema"]["columns"][3]["name"], "player_id");
        assert_eq!(doc["rows"][0], serde_json::json!([null, 3, 42, 111, true]));
    }

    #[test]
    fn test_rewrite_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonTableSink::new(dir.path()).unwrap();
        sink.write_table(&sample_table()).unwrap();
        sink.write_table(&sample_table()).unwrap();
        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1, "temp files never linger");
    }
}
