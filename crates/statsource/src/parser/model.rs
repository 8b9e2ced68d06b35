use chrono::NaiveDateTime;
use thiserror::Error;

/// Why a buffer did not fit a template. Never fatal; the occurrence is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("empty buffer")]
    Empty,

    #[error("first line has no timestamp")]
    Timestamp,

    #[error("line {line} does not match the template")]
    LineMismatch { line: usize },

    #[error("required field {0} is missing")]
    MissingField(&'static str),

    #[error("field {field} rejected value {value:?}")]
    Rejected { field: &'static str, value: String },
}

/// Named fields pulled out of one event buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Captures {
    pub timestamp: NaiveDateTime,
    /// The literal stamp of the first line, as written in the log.
    pub stamp: String,
    fields: Vec<(&'static str, String)>,
}

impl Captures {
    pub fn new(timestamp: NaiveDateTime, stamp: impl Into<String>) -> Self {
        Self {
            timestamp,
            stamp: stamp.into(),
            fields: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: &'static str, value: String) {
        self.fields.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
