//! Traversal output: a stored edge or a synthesized multi-hop chain.

use serde::Serialize;

use crate::model::{EntityId, Relationship};
use crate::{OwnregError, Result};

/// Aggregate edge summarizing a path of two or more stored relationships.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesizedChain {
    /// Terminal owner of the path.
    pub source: EntityId,
    /// The entity the query started from.
    pub target: EntityId,
    /// Entities strictly between target and source, walked owner-ward.
    pub intermediate_entities: Vec<EntityId>,
    /// Every edge on the path, walked owner-ward.
    pub intermediate_relationships: Vec<Relationship>,
}

/// An ownership chain discovered by the path finder.
///
/// Single-hop chains are the stored relationship itself; longer chains are
/// synthesized. Both expose the same read accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainRelationship {
    Direct(Relationship),
    Synthesized(SynthesizedChain),
}

impl ChainRelationship {
    /// Build the chain for a walked path `start <- e1 <- ... <- terminal`.
    ///
    /// `intermediates` must hold exactly `edges.len() - 1` entities.
    pub fn from_path(
        start: &EntityId,
        terminal: &EntityId,
        intermediates: &[EntityId],
        edges: &[Relationship],
    ) -> Result<Self> {
        if edges.is_empty() {
            return Err(OwnregError::InvalidArgument(
                "a chain needs at least one relationship".to_string(),
            ));
        }
        if intermediates.len() + 1 != edges.len() {
            return Err(OwnregError::InvalidArgument(format!(
                "{} relationships need {} intermediate entities, got {}",
                edges.len(),
                edges.len() - 1,
                intermediates.len()
            )));
        }

        if edges.len() == 1 {
            return Ok(ChainRelationship::Direct(edges[0].clone()));
        }

        Ok(ChainRelationship::Synthesized(SynthesizedChain {
            source: terminal.clone(),
            target: start.clone(),
            intermediate_entities: intermediates.to_vec(),
            intermediate_relationships: edges.to_vec(),
        }))
    }

    pub fn source(&self) -> &EntityId {
        match self {
            ChainRelationship::Direct(rel) => &rel.source,
            ChainRelationship::Synthesized(chain) => &chain.source,
        }
    }

    pub fn target(&self) -> &EntityId {
        match self {
            ChainRelationship::Direct(rel) => &rel.target,
            ChainRelationship::Synthesized(chain) => &chain.target,
        }
    }

    pub fn intermediate_entities(&self) -> &[EntityId] {
        match self {
            ChainRelationship::Direct(_) => &[],
            ChainRelationship::Synthesized(chain) => &chain.intermediate_entities,
        }
    }

    /// All edges on the chain; a direct chain yields its own relationship.
    pub fn intermediate_relationships(&self) -> &[Relationship] {
        match self {
            ChainRelationship::Direct(rel) => std::slice::from_ref(rel),
            ChainRelationship::Synthesized(chain) => &chain.intermediate_relationships,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.intermediate_relationships().len()
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, ChainRelationship::Direct(_))
    }
}

impl PartialEq<Relationship> for ChainRelationship {
    fn eq(&self, other: &Relationship) -> bool {
        matches!(self, ChainRelationship::Direct(rel) if rel == other)
    }
}
