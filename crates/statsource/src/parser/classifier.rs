//! Multi-line event classifier.
//!
//! Groups consecutive server log lines into one buffer per event occurrence:
//! - Each event kind names one category fragment per physical line
//! - At most one candidate is open at a time
//! - Bounded kinds close as soon as the tick changes
//! - A line that fits nothing is discarded and leaves the candidate open
//! - At most one completed buffer is handed out per line

use super::line;
use super::taxonomy::EventKind;

enum GroupAction {
    /// The open candidate is done; this line may still start a new one.
    Flush,
    AddToCurrent,
    StartNew(EventKind),
    Discard,
}

/// A fully grouped occurrence, ready for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub kind: EventKind,
    pub text: String,
}

#[derive(Debug)]
struct Candidate {
    kind: EventKind,
    text: String,
    matched: usize,
    tick: String,
}

impl Candidate {
    fn new(kind: EventKind, line: &str) -> Self {
        let mut text = String::with_capacity(line.len() + 1);
        text.push_str(line);
        text.push('\n');
        Self {
            kind,
            text,
            matched: 1,
            tick: line::tick(line).unwrap_or_default().to_string(),
        }
    }

    fn push(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
        self.matched += 1;
    }

    fn into_completed(self) -> Completed {
        Completed {
            kind: self.kind,
            text: self.text,
        }
    }
}

#[derive(Debug, Default)]
pub struct Classifier {
    pending: Option<Candidate>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed one line, matching new candidates only against `kinds`.
    pub fn feed(&mut self, text: &str, kinds: &[EventKind]) -> Option<Completed> {
        if !line::is_candidate(text) {
            return None;
        }

        let mut completed = None;
        if let Some(action) = self.continue_pending(text) {
            match action {
                GroupAction::AddToCurrent => {
                    if let Some(candidate) = self.pending.as_mut() {
                        candidate.push(text);
                    }
                    tracing::trace!("classifier: continuation matched");
                    return None;
                }
                GroupAction::Flush => completed = self.finish(),
                GroupAction::StartNew(_) | GroupAction::Discard => {}
            }
        }

        match Self::first_match(text, kinds) {
            GroupAction::StartNew(kind) => {
                if completed.is_none() {
                    completed = self.finish();
                }
                tracing::trace!(kind = kind.name(), "classifier: new candidate");
                self.pending = Some(Candidate::new(kind, text));
            }
            _ => tracing::trace!("classifier: line discarded"),
        }
        completed
    }

    /// Hand out whatever is still open, e.g. at end of file.
    pub fn finish(&mut self) -> Option<Completed> {
        self.pending.take().map(Candidate::into_completed)
    }

    fn continue_pending(&self, text: &str) -> Option<GroupAction> {
        let candidate = self.pending.as_ref()?;
        let def = candidate.kind.definition();
        let tick = line::tick(text).unwrap_or_default();

        if candidate.matched >= def.fragments.len() || (def.bounded && candidate.tick != tick) {
            Some(GroupAction::Flush)
        } else if def.matches(text, candidate.matched) {
            Some(GroupAction::AddToCurrent)
        } else {
            None
        }
    }

    fn first_match(text: &str, kinds: &[EventKind]) -> GroupAction {
        kinds
            .iter()
            .copied()
            .find(|kind| kind.definition().matches(text, 0))
            .map_or(GroupAction::Discard, GroupAction::StartNew)
    }
}
