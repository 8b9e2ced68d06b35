//! Entity — kinds, records, and deterministic identifiers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Map,
    Faction,
    Role,
    Weapon,
    Vehicle,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Map,
        EntityKind::Faction,
        EntityKind::Role,
        EntityKind::Weapon,
        EntityKind::Vehicle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Map => "map",
            EntityKind::Faction => "faction",
            EntityKind::Role => "role",
            EntityKind::Weapon => "weapon",
            EntityKind::Vehicle => "vehicle",
        }
    }
}

/// A named game entity. Only factions carry an abbreviation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: i64,
    pub kind: EntityKind,
    pub name: String,
    pub abbreviation: Option<String>,
}

impl Entity {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: entity_id(&name),
            kind,
            name,
            abbreviation: None,
        }
    }

    pub fn faction(name: impl Into<String>, abbreviation: impl Into<String>) -> Self {
        let mut entity = Self::new(EntityKind::Faction, name);
        entity.abbreviation = Some(abbreviation.into());
        entity
    }
}

/// CRC-32 (IEEE) of the UTF-8 bytes of `name`, widened to i64.
///
/// The identifier depends only on the name, so unregistered names still map
/// to a stable id and every run produces the same ids.
pub fn entity_id(name: &str) -> i64 {
    i64::from(crc32fast::hash(name.as_bytes()))
}

/// Strip the trailing per-instance suffix from an actor class name.
///
/// `BP_BTR80_C_2130303191` becomes `BP_BTR80_C`. Names that already end in
/// `_C`, or contain no `_C` marker at all, are returned unchanged.
pub fn trim_instance_id(name: &str) -> &str {
    match name.rfind("_C") {
        Some(idx) => &name[..idx + 2],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Identifiers ─────────────────────────────────────────────

    #[test]
    fn test_entity_id_matches_crc32() {
        assert_eq!(
            entity_id("The quick brown fox jumps over the lazy dog"),
            0x414F_A339
        );
    }

    #[test]
    fn test_entity_id_is_deterministic() {
        assert_eq!(entity_id("Rifleman"), entity_id("Rifleman"));
        assert_ne!(entity_id("Rifleman"), entity_id("rifleman"));
    }

    #[test]
    fn test_entity_id_is_never_negative() {
        for name in ["", "a", "Narva", "Russian Ground Forces", "ÄÖÜ"] {
            assert!(entity_id(name) >= 0);
            assert!(entity_id(name) <= i64::from(u32::MAX));
        }
    }

    #[test]
    fn test_entity_new_hashes_name() {
        let entity = Entity::new(EntityKind::Weapon, "BP_AK74_C");
        assert_eq!(entity.id, entity_id("BP_AK74_C"));
        assert!(entity.abbreviation.is_none());
    }

    #[test]
    fn test_faction_carries_abbreviation() {
        let entity = Entity::faction("Russian Ground Forces", "RU");
        assert_eq!(entity.kind, EntityKind::Faction);
        assert_eq!(entity.abbreviation.as_deref(), Some("RU"));
    }

    // ── Instance suffix trimming ────────────────────────────────

    #[test]
    fn test_trim_instance_id_strips_suffix() {
        assert_eq!(trim_instance_id("BP_BTR80_C_2130303191"), "BP_BTR80_C");
        assert_eq!(
            trim_instance_id("BP_Soldier_RU_Medic_C_2147481234"),
            "BP_Soldier_RU_Medic_C"
        );
    }

    #[test]
    fn test_trim_instance_id_keeps_class_names() {
        assert_eq!(trim_instance_id("BP_M4_C"), "BP_M4_C");
        assert_eq!(trim_instance_id("Rifle"), "Rifle");
        assert_eq!(trim_instance_id(""), "");
    }
}
