//! Cell — concrete values and values deferred until the match is flushed.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::registry::EntityKind;
use crate::session::Side;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f32),
    Bool(bool),
    Timestamp(NaiveDateTime),
}

/// A value whose final content is only known at flush time.
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    /// The faction holding this side when the match is flushed.
    MatchSide(Side),
    /// An entity id looked up by name; underscores read as spaces.
    Entity { kind: EntityKind, name: String },
}

/// What deferred cells are resolved against.
pub trait Resolve {
    fn match_side(&self, side: Side) -> Option<i64>;
    fn entity_id(&self, kind: EntityKind, name: &str) -> i64;
}

impl Deferred {
    /// Pure in the resolver's state; resolving twice yields the same value.
    pub fn resolve(&self, resolver: &impl Resolve) -> Value {
        match self {
            Deferred::MatchSide(side) => resolver
                .match_side(*side)
                .map_or(Value::Null, Value::Int),
            Deferred::Entity { kind, name } => {
                Value::Int(resolver.entity_id(*kind, &name.replace('_', " ")))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(Value),
    Pending(Deferred),
}

impl Cell {
    pub const NULL: Cell = Cell::Value(Value::Null);

    pub fn is_pending(&self) -> bool {
        matches!(self, Cell::Pending(_))
    }

    /// Unresolved cells become null.
    pub fn into_value(self) -> Value {
        match self {
            Cell::Value(value) => value,
            Cell::Pending(_) => Value::Null,
        }
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        Cell::Value(value)
    }
}

impl From<Deferred> for Cell {
    fn from(deferred: Deferred) -> Self {
        Cell::Pending(deferred)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Value(Value::Int(v))
    }
}

impl From<Option<i64>> for Cell {
    fn from(v: Option<i64>) -> Self {
        Cell::Value(v.map_or(Value::Null, Value::Int))
    }
}

impl From<f32> for Cell {
    fn from(v: f32) -> Self {
        Cell::Value(Value::Float(v))
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Cell::Value(Value::Bool(v))
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(v: NaiveDateTime) -> Self {
        Cell::Value(Value::Timestamp(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::entity_id;

    struct Fixed {
        one: Option<i64>,
    }

    impl Resolve for Fixed {
        fn match_side(&self, side: Side) -> Option<i64> {
            match side {
                Side::One => self.one,
                Side::Two => None,
            }
        }

        fn entity_id(&self, _kind: EntityKind, name: &str) -> i64 {
            entity_id(name)
        }
    }

    #[test]
    fn test_match_side_resolves_or_nulls() {
        let resolver = Fixed { one: Some(9) };
        assert_eq!(Deferred::MatchSide(Side::One).resolve(&resolver), Value::Int(9));
        assert_eq!(Deferred::MatchSide(Side::Two).resolve(&resolver), Value::Null);
    }

    #[test]
    fn test_entity_reference_reads_underscores_as_spaces() {
        let resolver = Fixed { one: None };
        let deferred = Deferred::Entity {
            kind: EntityKind::Map,
            name: "Narva_RAAS_v1".into(),
        };
        assert_eq!(deferred.resolve(&resolver), Value::Int(entity_id("Narva RAAS v1")));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let resolver = Fixed { one: Some(3) };
        let deferred = Deferred::MatchSide(Side::One);
        assert_eq!(deferred.resolve(&resolver), deferred.resolve(&resolver));
    }

    #[test]
    fn test_value_serializes_untagged() {
        let json = serde_json::to_string(&vec![Value::Null, Value::Int(4), Value::Bool(true)]).unwrap();
        assert_eq!(json, "[null,4,true]");
    }

    #[test]
    fn test_unresolved_cell_becomes_null() {
        let cell = Cell::from(Deferred::MatchSide(Side::One));
        assert!(cell.is_pending());
        assert_eq!(cell.into_value(), Value::Null);
    }
}
