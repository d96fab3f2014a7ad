use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityId;

/// Where a relationship was imported from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub retrieved_at: Option<DateTime<Utc>>,
    pub imported_at: Option<DateTime<Utc>>,
}

/// A stored ownership edge: `source` owns or controls `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique relationship key.
    pub id: String,
    /// The owner.
    pub source: EntityId,
    /// The owned entity.
    pub target: EntityId,
    /// ISO 8601 date, possibly partial (`2016`, `2016-04`).
    pub started_date: Option<String>,
    pub ended_date: Option<String>,
    pub provenance: Option<Provenance>,
}

impl Relationship {
    /// Bare edge without dates or provenance.
    pub fn new(id: impl Into<String>, source: EntityId, target: EntityId) -> Self {
        Self {
            id: id.into(),
            source,
            target,
            started_date: None,
            ended_date: None,
            provenance: None,
        }
    }
}
