//! Relationship graph: edge reads, chain synthesis and owner-ward traversal.
//!
//! Given an entity, finds the ultimate owners at the top of its ownership
//! chains and every path linking it to a specific owner, terminating on
//! cycles and enumerating every branch of a diamond.

mod chain;
mod path_finder;
mod store;

pub use chain::{ChainRelationship, SynthesizedChain};
pub use path_finder::PathFinder;
pub use store::{GraphStore, MemoryGraphStore, SqliteGraphStore};
