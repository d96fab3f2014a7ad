pub mod config;
pub mod error;
pub mod db;
pub mod model;
pub mod graph;
pub mod import;
pub mod clients;

pub use config::Config;
pub use error::{OwnregError, Result};
pub use graph::{ChainRelationship, GraphStore, PathFinder};
pub use model::{Entity, EntityId, Relationship};
