//! Read side of the relationship graph.
//!
//! The path finder only ever asks one question: "who directly owns this
//! entity?". Answers must come back in relationship creation order so that
//! traversal results are reproducible.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::Db;
use crate::model::{Entity, EntityId, EntityType, Provenance, Relationship};
use crate::Result;

/// Source of incoming ownership edges.
pub trait GraphStore {
    /// Relationships whose `target` is `entity`, in creation order.
    fn incoming_relationships(&self, entity: &EntityId) -> Result<Vec<Relationship>>;
}

impl<S: GraphStore + ?Sized> GraphStore for &S {
    fn incoming_relationships(&self, entity: &EntityId) -> Result<Vec<Relationship>> {
        (**self).incoming_relationships(entity)
    }
}

/// Insertion-ordered in-process graph.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    relationships: Vec<Relationship>,
    by_target: HashMap<EntityId, Vec<usize>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_relationship(&mut self, relationship: Relationship) {
        let index = self.relationships.len();
        self.by_target
            .entry(relationship.target.clone())
            .or_default()
            .push(index);
        self.relationships.push(relationship);
    }
}

impl FromIterator<Relationship> for MemoryGraphStore {
    fn from_iter<I: IntoIterator<Item = Relationship>>(iter: I) -> Self {
        let mut store = Self::new();
        for relationship in iter {
            store.add_relationship(relationship);
        }
        store
    }
}

impl GraphStore for MemoryGraphStore {
    fn incoming_relationships(&self, entity: &EntityId) -> Result<Vec<Relationship>> {
        Ok(self
            .by_target
            .get(entity)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&i| self.relationships[i].clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

const INCOMING_RELATIONSHIPS_SQL: &str = "\
SELECT relationship_id, source_entity, target_entity, started_date, ended_date,
       source_url, source_name, retrieved_at, imported_at
FROM relationships
WHERE target_entity = ?1
ORDER BY seq ASC";

const ENTITY_SQL: &str = "\
SELECT entity_id, entity_type, name, jurisdiction_code, company_number
FROM entities
WHERE entity_id = ?1";

/// Graph store backed by the register's SQLite database.
///
/// Holds its own connection; open one store per thread.
pub struct SqliteGraphStore {
    conn: Connection,
}

impl std::fmt::Debug for SqliteGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteGraphStore").finish_non_exhaustive()
    }
}

impl SqliteGraphStore {
    pub fn open(db: &Db) -> Result<Self> {
        Ok(Self::from_connection(db.open_connection()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn entity(&self, id: &EntityId) -> Result<Option<Entity>> {
        let mut stmt = self.conn.prepare_cached(ENTITY_SQL)?;
        let entity = stmt
            .query_row(params![id.as_str()], |row| {
                Ok(Entity {
                    id: EntityId::new(row.get::<_, String>(0)?),
                    entity_type: EntityType::parse(&row.get::<_, String>(1)?),
                    name: row.get(2)?,
                    jurisdiction_code: row.get(3)?,
                    company_number: row.get(4)?,
                })
            })
            .optional()?;
        Ok(entity)
    }

    pub fn relationship_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl GraphStore for SqliteGraphStore {
    fn incoming_relationships(&self, entity: &EntityId) -> Result<Vec<Relationship>> {
        let mut stmt = self.conn.prepare_cached(INCOMING_RELATIONSHIPS_SQL)?;
        let rows = stmt.query_map(params![entity.as_str()], row_to_relationship)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let Some(text) = row.get::<_, Option<String>>(idx)? else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_relationship(row: &Row<'_>) -> rusqlite::Result<Relationship> {
    let provenance = Provenance {
        source_url: row.get(5)?,
        source_name: row.get(6)?,
        retrieved_at: parse_timestamp(row, 7)?,
        imported_at: parse_timestamp(row, 8)?,
    };
    let has_provenance = provenance != Provenance::default();

    Ok(Relationship {
        id: row.get(0)?,
        source: EntityId::new(row.get::<_, String>(1)?),
        target: EntityId::new(row.get::<_, String>(2)?),
        started_date: row.get(3)?,
        ended_date: row.get(4)?,
        provenance: has_provenance.then_some(provenance),
    })
}
