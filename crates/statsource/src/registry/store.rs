//! Store — per-kind entity collections with exact and fuzzy lookup.

use std::collections::HashMap;

use super::catalog::Catalog;
use super::entity::{entity_id, Entity, EntityKind};

/// Result of a nearest-name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyMatch {
    pub id: i64,
    pub distance: usize,
}

#[derive(Debug, Clone, Default)]
struct Collection {
    entries: Vec<Entity>,
    index: HashMap<i64, usize>,
}

impl Collection {
    fn insert(&mut self, entity: Entity) -> i64 {
        let id = entity.id;
        if !self.index.contains_key(&id) {
            self.index.insert(id, self.entries.len());
            self.entries.push(entity);
        }
        id
    }

    fn nearest<'a>(&'a self, key: impl Fn(&'a Entity) -> Option<&'a str>, name: &str) -> Option<FuzzyMatch> {
        let mut best: Option<FuzzyMatch> = None;
        for entity in &self.entries {
            let Some(candidate) = key(entity) else {
                continue;
            };
            let distance = strsim::levenshtein(candidate, name);
            // Strictly smaller wins, so ties keep the earliest registration.
            if best.map_or(true, |b| distance < b.distance) {
                best = Some(FuzzyMatch { id: entity.id, distance });
            }
        }
        best
    }
}

/// Per-worker registry of maps, factions, roles, weapons, and vehicles.
///
/// Collections keep insertion order; fuzzy ties resolve to the entry that
/// was registered first.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    collections: HashMap<EntityKind, Collection>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut registry = Self::new();
        for entity in catalog.entities() {
            registry.register(entity);
        }
        registry
    }

    /// Insert if absent. Returns the entity id either way.
    pub fn register(&mut self, entity: Entity) -> i64 {
        self.collections.entry(entity.kind).or_default().insert(entity)
    }

    pub fn register_name(&mut self, kind: EntityKind, name: &str) -> i64 {
        self.register(Entity::new(kind, name))
    }

    pub fn get(&self, kind: EntityKind, id: i64) -> Option<&Entity> {
        let collection = self.collections.get(&kind)?;
        collection.index.get(&id).map(|&i| &collection.entries[i])
    }

    pub fn contains(&self, kind: EntityKind, name: &str) -> bool {
        self.get(kind, entity_id(name)).is_some()
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.collections.get(&kind).map_or(0, |c| c.entries.len())
    }

    pub fn is_empty(&self, kind: EntityKind) -> bool {
        self.len(kind) == 0
    }

    /// Exact resolution. Unregistered names still get their deterministic id.
    pub fn resolve(&self, name: &str, kind: EntityKind) -> i64 {
        let id = entity_id(name);
        if self.get(kind, id).is_none() {
            tracing::trace!(kind = kind.as_str(), name, "resolving unregistered entity");
        }
        id
    }

    /// Faction whose abbreviation is nearest to `abbreviation`.
    pub fn faction_by_abbreviation(&self, abbreviation: &str) -> Option<FuzzyMatch> {
        self.collections
            .get(&EntityKind::Faction)?
            .nearest(|e| e.abbreviation.as_deref(), abbreviation)
    }
}
