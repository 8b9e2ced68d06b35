//! Template — declarative field extraction from a classified event buffer.
//!
//! A template lists, per physical line, the literal text and fields found
//! after the category column. A field runs up to the first occurrence of the
//! literal that follows it, or to the end of the line when it is last.
//! Text after a trailing literal is ignored.

use super::line;
use super::model::{Captures, TemplateError};

/// Post-extraction step applied to a field value, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Keep the text after the first occurrence of the delimiter.
    After(&'static str),
    /// Keep the text before the first occurrence of the delimiter.
    Before(&'static str),
    /// Drop this many trailing characters.
    ChopEnd(usize),
    /// Void the occurrence if the value equals this sentinel (case-insensitive).
    NotEqual(&'static str),
    /// Void the occurrence unless the value equals this sentinel (case-insensitive).
    Equals(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub transforms: &'static [Transform],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Lit(&'static str),
    /// A value that is matched but not kept.
    Skip,
    Field(FieldSpec),
}

pub const fn lit(text: &'static str) -> Segment {
    Segment::Lit(text)
}

pub const fn skip() -> Segment {
    Segment::Skip
}

pub const fn req(name: &'static str, transforms: &'static [Transform]) -> Segment {
    Segment::Field(FieldSpec { name, required: true, transforms })
}

pub const fn opt(name: &'static str, transforms: &'static [Transform]) -> Segment {
    Segment::Field(FieldSpec { name, required: false, transforms })
}

#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub lines: &'static [&'static [Segment]],
}

impl Template {
    /// Extract fields from `buffer`, one template line per buffer line.
    ///
    /// A line that fails to match voids the occurrence only if it declares a
    /// required field; otherwise its fields are simply absent.
    pub fn extract(&self, buffer: &str) -> Result<Captures, TemplateError> {
        let lines: Vec<&str> = buffer.lines().collect();
        let first = lines.first().ok_or(TemplateError::Empty)?;
        let stamp = line::stamp(first).ok_or(TemplateError::Timestamp)?;
        let timestamp = line::parse_timestamp(stamp).ok_or(TemplateError::Timestamp)?;
        let mut captures = Captures::new(timestamp, stamp);

        for (index, segments) in self.lines.iter().enumerate() {
            let required = required_field(segments);
            let Some(text) = lines.get(index) else {
                if let Some(name) = required {
                    return Err(TemplateError::MissingField(name));
                }
                continue;
            };

            let mut fields = Vec::new();
            match line::body(text).map(|body| match_line(body, segments, &mut fields)) {
                Some(Ok(())) => {}
                Some(Err(LineFailure::Rejected(err))) => return Err(err),
                Some(Err(LineFailure::Mismatch)) | None => {
                    if required.is_some() {
                        return Err(TemplateError::LineMismatch { line: index });
                    }
                    continue;
                }
            }

            for (spec, value) in fields {
                if value.is_empty() {
                    if spec.required {
                        return Err(TemplateError::MissingField(spec.name));
                    }
                    continue;
                }
                captures.insert(spec.name, value);
            }
        }

        Ok(captures)
    }
}

enum LineFailure {
    Mismatch,
    Rejected(TemplateError),
}

fn required_field(segments: &[Segment]) -> Option<&'static str> {
    segments.iter().find_map(|s| match s {
        Segment::Field(spec) if spec.required => Some(spec.name),
        _ => None,
    })
}

fn match_line(
    body: &str,
    segments: &[Segment],
    fields: &mut Vec<(FieldSpec, String)>,
) -> Result<(), LineFailure> {
    let mut pos = 0;
    let mut open: Option<Segment> = None;

    for segment in segments {
        match segment {
            Segment::Lit(text) => {
                let rest = &body[pos..];
                match open.take() {
                    None => {
                        if !rest.starts_with(text) {
                            return Err(LineFailure::Mismatch);
                        }
                        pos += text.len();
                    }
                    Some(capture) => {
                        let end = rest.find(text).ok_or(LineFailure::Mismatch)?;
                        keep(capture, &rest[..end], fields)?;
                        pos += end + text.len();
                    }
                }
            }
            Segment::Skip | Segment::Field(_) => {
                if let Some(previous) = open.replace(*segment) {
                    keep(previous, "", fields)?;
                }
            }
        }
    }

    if let Some(capture) = open {
        keep(capture, body[pos..].trim_end(), fields)?;
    }
    Ok(())
}

fn keep(segment: Segment, raw: &str, fields: &mut Vec<(FieldSpec, String)>) -> Result<(), LineFailure> {
    if let Segment::Field(spec) = segment {
        let value = apply(&spec, raw).map_err(LineFailure::Rejected)?;
        fields.push((spec, value));
    }
    Ok(())
}

fn apply(spec: &FieldSpec, raw: &str) -> Result<String, TemplateError> {
    let mut value = raw.to_string();
    for transform in spec.transforms {
        match *transform {
            Transform::After(delimiter) => {
                if let Some(i) = value.find(delimiter) {
                    value = value[i + delimiter.len()..].to_string();
                }
            }
            Transform::Before(delimiter) => {
                if let Some(i) = value.find(delimiter) {
                    value.truncate(i);
                }
            }
            Transform::ChopEnd(n) => {
                let keep = value.chars().count().saturating_sub(n);
                value = value.chars().take(keep).collect();
            }
            Transform::NotEqual(sentinel) => {
                if value.is_empty() || value.eq_ignore_ascii_case(sentinel) {
                    return Err(TemplateError::Rejected { field: spec.name, value });
                }
            }
            Transform::Equals(sentinel) => {
                if value.is_empty() || !value.eq_ignore_ascii_case(sentinel) {
                    return Err(TemplateError::Rejected { field: spec.name, value });
                }
            }
        }
    }
    Ok(value)
}
