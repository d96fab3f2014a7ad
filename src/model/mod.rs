//! Register records: entities (graph nodes) and relationships (ownership edges).
//!
//! Both are created by import pipelines and only read by the graph traversal.

mod entity;
mod relationship;

pub use entity::{Entity, EntityId, EntityType};
pub use relationship::{Provenance, Relationship};
