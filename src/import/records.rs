//! Import document format.
//!
//! ```json
//! {
//!   "source_name": "GB PSC Snapshot",
//!   "source_url": "http://download.companieshouse.gov.uk/en_pscdata.html",
//!   "retrieved_at": "2017-06-01T00:00:00Z",
//!   "entities": [
//!     { "jurisdiction_code": "gb", "company_number": "07711111", "name": "FLAGSTAFF 1 LIMITED" },
//!     { "id": "hdc", "type": "legal-entity", "name": "Huntingdonshire District Council" }
//!   ],
//!   "relationships": [
//!     { "source": "hdc", "target": { "jurisdiction_code": "gb", "company_number": "07711111" } }
//!   ]
//! }
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{Entity, EntityId, EntityType};
use crate::{OwnregError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportDocument {
    pub source_name: Option<String>,
    pub source_url: Option<String>,
    pub retrieved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
}

impl ImportDocument {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Scope for keys derived from record positions in this document.
    pub fn source_key(&self) -> &str {
        self.source_name.as_deref().map(str::trim).unwrap_or("")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityRecord {
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub entity_type: EntityType,
    pub name: Option<String>,
    pub jurisdiction_code: Option<String>,
    pub company_number: Option<String>,
}

impl EntityRecord {
    /// Identity key: explicit id, else jurisdiction + company number, else
    /// a key derived from the record's source, position, type and name.
    ///
    /// Re-importing the same document therefore resolves every record to the
    /// same key.
    pub fn resolve_id(&self, source: &str, index: usize) -> EntityId {
        if let Some(id) = self.id.as_deref().filter(|id| !id.trim().is_empty()) {
            return EntityId::new(id);
        }
        match (self.jurisdiction_code.as_deref(), self.company_number.as_deref()) {
            (Some(jc), Some(number)) if !jc.trim().is_empty() && !number.trim().is_empty() => {
                EntityId::for_company(jc, number)
            }
            _ => EntityId::derived(&[
                "entity",
                source,
                &index.to_string(),
                self.entity_type.as_str(),
                self.name.as_deref().map(str::trim).unwrap_or(""),
            ]),
        }
    }

    pub fn to_entity(&self, source: &str, index: usize) -> Result<Entity> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| OwnregError::Parse("entity record has no name".to_string()))?;

        Ok(Entity {
            id: self.resolve_id(source, index),
            entity_type: self.entity_type,
            name: name.to_string(),
            jurisdiction_code: self.jurisdiction_code.as_deref().map(|jc| jc.trim().to_lowercase()),
            company_number: self.company_number.as_deref().map(|n| n.trim().to_string()),
        })
    }
}

/// Relationship endpoint: a plain entity key or a company identifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Key(String),
    Company {
        jurisdiction_code: String,
        company_number: String,
    },
}

impl EntityRef {
    pub fn resolve(&self) -> EntityId {
        match self {
            EntityRef::Key(key) => EntityId::new(key.as_str()),
            EntityRef::Company {
                jurisdiction_code,
                company_number,
            } => EntityId::for_company(jurisdiction_code, company_number),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationshipRecord {
    pub id: Option<String>,
    /// The owner.
    pub source: Option<EntityRef>,
    /// The owned entity.
    pub target: Option<EntityRef>,
    pub started_date: Option<String>,
    pub ended_date: Option<String>,
}

impl RelationshipRecord {
    /// Relationship id: explicit id, else derived from the record's source,
    /// position and resolved endpoints.
    pub fn resolve_id(
        &self,
        source: &str,
        index: usize,
        owner: &EntityId,
        owned: &EntityId,
    ) -> String {
        match self.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => EntityId::derived(&[
                "relationship",
                source,
                &index.to_string(),
                owner.as_str(),
                owned.as_str(),
            ])
            .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_key_resolution_order() {
        let explicit: EntityRecord = serde_json::from_str(
            r#"{"id": "hdc", "jurisdiction_code": "gb", "company_number": "1", "name": "X"}"#,
        )
        .unwrap();
        assert_eq!(explicit.resolve_id("GB PSC Snapshot", 0).as_str(), "hdc");

        let company: EntityRecord = serde_json::from_str(
            r#"{"jurisdiction_code": "GB", "company_number": "0000000B", "name": "B"}"#,
        )
        .unwrap();
        assert_eq!(company.resolve_id("GB PSC Snapshot", 1).as_str(), "gb/0000000B");

        let anonymous: EntityRecord =
            serde_json::from_str(r#"{"type": "natural-person", "name": "Jan Novak"}"#).unwrap();
        assert_eq!(anonymous.entity_type, EntityType::NaturalPerson);
        assert_eq!(anonymous.resolve_id("SK RPVS", 2), anonymous.resolve_id("SK RPVS", 2));
        assert_ne!(anonymous.resolve_id("SK RPVS", 2), anonymous.resolve_id("SK RPVS", 3));
        assert_ne!(anonymous.resolve_id("SK RPVS", 2), anonymous.resolve_id("GB PSC", 2));
    }

    #[test]
    fn test_relationship_id_resolution() {
        let (owner, owned) = (EntityId::new("hdc"), EntityId::new("gb/03736718"));

        let explicit: RelationshipRecord =
            serde_json::from_str(r#"{"id": " r1 ", "source": "hdc", "target": "gb/03736718"}"#)
                .unwrap();
        assert_eq!(explicit.resolve_id("GB PSC", 0, &owner, &owned), "r1");

        let anonymous: RelationshipRecord =
            serde_json::from_str(r#"{"source": "hdc", "target": "gb/03736718"}"#).unwrap();
        let key = anonymous.resolve_id("GB PSC", 0, &owner, &owned);
        assert_eq!(key, anonymous.resolve_id("GB PSC", 0, &owner, &owned));
        assert_ne!(key, anonymous.resolve_id("GB PSC", 1, &owner, &owned));
        assert_ne!(key, anonymous.resolve_id("GB PSC", 0, &owned, &owner));
    }

    #[test]
    fn test_entity_without_name_is_rejected() {
        let record: EntityRecord = serde_json::from_str(
            r#"{"jurisdiction_code": "gb", "company_number": "1", "name": "  "}"#,
        )
        .unwrap();
        assert!(matches!(record.to_entity("", 0), Err(OwnregError::Parse(_))));
    }

    #[test]
    fn test_entity_ref_forms() {
        let key: EntityRef = serde_json::from_str(r#""gb/07711111""#).unwrap();
        assert_eq!(key.resolve().as_str(), "gb/07711111");

        let company: EntityRef =
            serde_json::from_str(r#"{"jurisdiction_code": "bm", "company_number": "2106"}"#)
                .unwrap();
        assert_eq!(company.resolve().as_str(), "bm/2106");
    }

    #[test]
    fn test_document_defaults() {
        let doc = ImportDocument::from_json(r#"{"source_name": "SK RPVS"}"#).unwrap();
        assert_eq!(doc.source_name.as_deref(), Some("SK RPVS"));
        assert!(doc.entities.is_empty());
        assert!(doc.relationships.is_empty());

        assert!(matches!(
            ImportDocument::from_json("[1, 2"),
            Err(OwnregError::Parse(_))
        ));
    }
}
