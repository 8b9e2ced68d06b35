//! Reader — line-at-a-time access to a log that may still be growing.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Reads complete lines and keeps an unterminated tail until the writer
/// finishes it.
#[derive(Debug)]
pub struct LineReader {
    path: PathBuf,
    reader: BufReader<File>,
    partial: Vec<u8>,
    offset: u64,
}

impl LineReader {
    pub async fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            partial: Vec::new(),
            offset: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes consumed so far, including any held partial line.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The next newline-terminated line, or `None` when nothing complete is
    /// available yet. A later call picks up where the file has grown.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.partial).await?;
        self.offset += read as u64;
        if self.partial.last() != Some(&b'\n') {
            return Ok(None);
        }
        let raw = std::mem::take(&mut self.partial);
        Ok(Some(decode(&raw)))
    }

    /// Hand out the unterminated last line of a file that will not grow.
    pub fn take_partial(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.partial);
        Some(decode(&raw))
    }

    /// The file at our path is shorter than what we already read, so it was
    /// truncated or replaced. A file that is gone for the moment is not.
    pub async fn is_truncated(&self) -> io::Result<bool> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.len() < self.offset),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

fn decode(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim_end_matches(['\r', '\n']);
    text.strip_prefix('\u{feff}').unwrap_or(text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn append(path: &Path, text: &str) {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn test_reads_lines_without_terminators() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SquadGame.log");
        append(&path, "\u{feff}first\r\nsecond\n");

        let mut reader = LineReader::open(&path).await.unwrap();
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("first"));
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("second"));
        assert_eq!(reader.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_partial_line_waits_for_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SquadGame.log");
        append(&path, "half");

        let mut reader = LineReader::open(&path).await.unwrap();
        assert_eq!(reader.next_line().await.unwrap(), None);

        append(&path, " and half\n");
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("half and half"));
        assert_eq!(reader.offset(), 14);
    }

    #[tokio::test]
    async fn test_take_partial_returns_unterminated_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.log");
        append(&path, "done\ntail");

        let mut reader = LineReader::open(&path).await.unwrap();
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("done"));
        assert_eq!(reader.next_line().await.unwrap(), None);
        assert_eq!(reader.take_partial().as_deref(), Some("tail"));
        assert_eq!(reader.take_partial(), None);
    }

    #[tokio::test]
    async fn test_truncation_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SquadGame.log");
        append(&path, "one\ntwo\n");

        let mut reader = LineReader::open(&path).await.unwrap();
        while reader.next_line().await.unwrap().is_some() {}
        assert!(!reader.is_truncated().await.unwrap());

        std::fs::write(&path, "x\n").unwrap();
        assert!(reader.is_truncated().await.unwrap());

        std::fs::remove_file(&path).unwrap();
        assert!(!reader.is_truncated().await.unwrap());
    }
}
