use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted identity key of an entity.
///
/// Two entities with the same key are the same graph node, whatever the
/// rest of their attributes say.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Key with surrounding whitespace removed, so CLI input and imported
    /// keys compare equal.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        if key.trim().len() == key.len() {
            Self(key)
        } else {
            Self(key.trim().to_string())
        }
    }

    /// Deterministic key for a registered company, e.g. `gb/07711111`.
    pub fn for_company(jurisdiction_code: &str, company_number: &str) -> Self {
        Self(format!(
            "{}/{}",
            jurisdiction_code.trim().to_lowercase(),
            company_number.trim()
        ))
    }

    /// Stable key for records without registry identifiers, derived from
    /// whatever locates the record in its source. The same parts always give
    /// the same key.
    pub fn derived(parts: &[&str]) -> Self {
        let name = parts.join("\u{1f}");
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the key is unset (empty or whitespace only).
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for EntityId {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

/// Kind of person an entity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    #[default]
    LegalEntity,
    NaturalPerson,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::LegalEntity => "legal-entity",
            EntityType::NaturalPerson => "natural-person",
        }
    }

    /// Parse the stored text form; unknown values fall back to `LegalEntity`.
    pub fn parse(value: &str) -> Self {
        match value {
            "natural-person" => EntityType::NaturalPerson,
            _ => EntityType::LegalEntity,
        }
    }
}

/// A legal or natural person in the register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(default, rename = "type")]
    pub entity_type: EntityType,
    pub name: String,
    pub jurisdiction_code: Option<String>,
    pub company_number: Option<String>,
}

impl Entity {
    /// A legal entity keyed by its jurisdiction and company number.
    pub fn company(jurisdiction_code: &str, company_number: &str, name: &str) -> Self {
        Self {
            id: EntityId::for_company(jurisdiction_code, company_number),
            entity_type: EntityType::LegalEntity,
            name: name.to_string(),
            jurisdiction_code: Some(jurisdiction_code.trim().to_lowercase()),
            company_number: Some(company_number.trim().to_string()),
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}
