/// Server log parsing: line layout, event grouping, and field extraction.
///
/// # Architecture
///
/// - `line.rs`: fixed column layout (timestamp, tick, category column)
/// - `taxonomy.rs`: event kinds and their category fragments, in priority order
/// - `classifier.rs`: groups consecutive lines into one buffer per occurrence
/// - `template.rs`: declarative per-event field extraction
/// - `model.rs`: captured fields and template errors
///
/// Lines that fit nothing are dropped silently; a buffer that fails its
/// template is a non-match, never an error.

pub mod classifier;
pub mod line;
pub mod model;
pub mod taxonomy;
pub mod template;

pub use classifier::{Classifier, Completed};
pub use model::{Captures, TemplateError};
pub use taxonomy::{EventDef, EventKind};
pub use template::{lit, opt, req, skip, Segment, Template, Transform};
