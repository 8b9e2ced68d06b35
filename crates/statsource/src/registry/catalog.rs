//! Catalog — the static JSON dataset the registry is seeded from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entity::{Entity, EntityKind};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed catalog: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub weapons: Vec<ClassEntry>,
    pub teams: Vec<TeamEntry>,
    pub roles: Vec<NamedEntry>,
    pub vehicles: Vec<ClassEntry>,
    pub maps: Vec<NamedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub name: String,
    pub abbreviation: String,
}

impl Catalog {
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Every entity the catalog names, grouped by kind in file order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        let weapons = self
            .weapons
            .iter()
            .map(|w| Entity::new(EntityKind::Weapon, w.class.as_str()));
        let factions = self
            .teams
            .iter()
            .map(|t| Entity::faction(t.name.as_str(), t.abbreviation.as_str()));
        let roles = self
            .roles
            .iter()
            .map(|r| Entity::new(EntityKind::Role, r.name.as_str()));
        let vehicles = self
            .vehicles
            .iter()
            .map(|v| Entity::new(EntityKind::Vehicle, v.class.as_str()));
        let maps = self
            .maps
            .iter()
            .map(|m| Entity::new(EntityKind::Map, m.name.as_str()));

        weapons.chain(factions).chain(roles).chain(vehicles).chain(maps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "weapons": [{ "class": "BP_AK74_C" }, { "class": "BP_M4_C", "displayName": "M4" }],
        "teams": [
            { "name": "Russian Ground Forces", "abbreviation": "RU" },
            { "name": "United States Army", "abbreviation": "USA" }
        ],
        "roles": [{ "name": "RU_Rifleman_01" }],
        "vehicles": [{ "class": "BP_BTR80_C" }]
    }"#;

    #[test]
    fn test_catalog_parses_sections() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.weapons.len(), 2);
        assert_eq!(catalog.teams[1].abbreviation, "USA");
        assert_eq!(catalog.roles[0].name, "RU_Rifleman_01");
        assert_eq!(catalog.vehicles[0].class, "BP_BTR80_C");
        assert!(catalog.maps.is_empty(), "maps are optional");
    }

    #[test]
    fn test_catalog_entities_cover_every_section() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let entities: Vec<Entity> = catalog.entities().collect();
        assert_eq!(entities.len(), 6);
        assert!(entities
            .iter()
            .any(|e| e.kind == EntityKind::Faction && e.abbreviation.as_deref() == Some("RU")));
    }

    #[test]
    fn test_catalog_rejects_malformed_json() {
        let err = Catalog::from_json("{ \"weapons\": 3 }").unwrap_err();
        assert!(matches!(err, CatalogError::Malformed(_)));
    }

    #[test]
    fn test_catalog_missing_file() {
        let err = Catalog::from_file(Path::new("/nonexistent/squad.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
