//! Registry module — game entities, the seed catalog, and id resolution.

pub mod catalog;
pub mod entity;
pub mod store;

pub use catalog::{Catalog, CatalogError};
pub use entity::{entity_id, trim_instance_id, Entity, EntityKind};
pub use store::{FuzzyMatch, Registry};
