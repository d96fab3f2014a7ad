//! Register writes: entity and relationship upserts.

use rusqlite::{params, Connection, OptionalExtension};

use crate::model::{Entity, EntityId, Relationship};
use crate::Result;

const UPSERT_ENTITY_SQL: &str = "\
INSERT INTO entities (entity_id, entity_type, name, jurisdiction_code, company_number)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(entity_id) DO UPDATE SET
  entity_type = excluded.entity_type,
  name = excluded.name,
  jurisdiction_code = COALESCE(excluded.jurisdiction_code, entities.jurisdiction_code),
  company_number = COALESCE(excluded.company_number, entities.company_number),
  updated_at = CURRENT_TIMESTAMP";

// Updating in place keeps `seq`, so a re-import never reorders edges.
const UPSERT_RELATIONSHIP_SQL: &str = "\
INSERT INTO relationships (
  relationship_id, source_entity, target_entity, started_date, ended_date,
  source_url, source_name, retrieved_at, imported_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
ON CONFLICT(relationship_id) DO UPDATE SET
  source_entity = excluded.source_entity,
  target_entity = excluded.target_entity,
  started_date = excluded.started_date,
  ended_date = excluded.ended_date,
  source_url = excluded.source_url,
  source_name = excluded.source_name,
  retrieved_at = excluded.retrieved_at,
  imported_at = excluded.imported_at";

/// Insert an entity, or merge it into the existing node with the same key.
pub fn upsert_entity(conn: &Connection, entity: &Entity) -> Result<()> {
    conn.prepare_cached(UPSERT_ENTITY_SQL)?.execute(params![
        entity.id.as_str(),
        entity.entity_type.as_str(),
        entity.name,
        entity.jurisdiction_code,
        entity.company_number,
    ])?;
    Ok(())
}

pub fn upsert_relationship(conn: &Connection, relationship: &Relationship) -> Result<()> {
    let provenance = relationship.provenance.clone().unwrap_or_default();
    conn.prepare_cached(UPSERT_RELATIONSHIP_SQL)?.execute(params![
        relationship.id,
        relationship.source.as_str(),
        relationship.target.as_str(),
        relationship.started_date,
        relationship.ended_date,
        provenance.source_url,
        provenance.source_name,
        provenance.retrieved_at.map(|t| t.to_rfc3339()),
        provenance.imported_at.map(|t| t.to_rfc3339()),
    ])?;
    Ok(())
}

pub fn entity_exists(conn: &Connection, id: &EntityId) -> Result<bool> {
    let found = conn
        .prepare_cached("SELECT 1 FROM entities WHERE entity_id = ?1")?
        .query_row(params![id.as_str()], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Rename an entity; returns false when no entity has that key.
pub fn update_entity_name(conn: &Connection, id: &EntityId, name: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE entities SET name = ?2, updated_at = CURRENT_TIMESTAMP WHERE entity_id = ?1",
        params![id.as_str(), name],
    )?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{migrate, Db};
    use crate::graph::{GraphStore, SqliteGraphStore};
    use std::path::Path;
    use tempfile::TempDir;

    fn setup() -> (Connection, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = Db::new(temp_dir.path().join("test.db")).open_connection().unwrap();
        let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
        migrate::run_migrations(&mut conn, &migrations_dir).unwrap();
        (conn, temp_dir)
    }

    #[test]
    fn test_duplicate_entity_merges_into_one_node() {
        let (conn, _temp) = setup();
        upsert_entity(&conn, &Entity::company("gb", "04782653", "LUMINUS GROUP LIMITED")).unwrap();
        upsert_entity(&conn, &Entity::company("GB", "04782653", "LUMINUS GROUP LTD")).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        let name: String = conn
            .query_row(
                "SELECT name FROM entities WHERE entity_id = 'gb/04782653'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(name, "LUMINUS GROUP LTD");
    }

    #[test]
    fn test_relationship_reimport_keeps_creation_order() {
        let (conn, _temp) = setup();
        let target = Entity::company("gb", "1", "Target");
        let first = Entity::company("gb", "2", "First");
        let second = Entity::company("gb", "3", "Second");
        for entity in [&target, &first, &second] {
            upsert_entity(&conn, entity).unwrap();
        }
        let mut r1 = Relationship::new("r1", first.id.clone(), target.id.clone());
        let r2 = Relationship::new("r2", second.id.clone(), target.id.clone());
        upsert_relationship(&conn, &r1).unwrap();
        upsert_relationship(&conn, &r2).unwrap();

        r1.ended_date = Some("2019-01-31".to_string());
        upsert_relationship(&conn, &r1).unwrap();

        let store = SqliteGraphStore::from_connection(conn);
        let incoming = store.incoming_relationships(&target.id).unwrap();
        assert_eq!(incoming, vec![r1, r2]);
    }

    #[test]
    fn test_relationship_requires_known_entities() {
        let (conn, _temp) = setup();
        let rel = Relationship::new("r1", EntityId::new("gb/x"), EntityId::new("gb/y"));
        assert!(upsert_relationship(&conn, &rel).is_err());
    }

    #[test]
    fn test_entity_exists_and_rename() {
        let (conn, _temp) = setup();
        let entity = Entity::company("sk", "35757442", "Slovenska posta");
        assert!(!entity_exists(&conn, &entity.id).unwrap());
        upsert_entity(&conn, &entity).unwrap();
        assert!(entity_exists(&conn, &entity.id).unwrap());

        assert!(update_entity_name(&conn, &entity.id, "SLOVENSKÁ POŠTA, a.s.").unwrap());
        assert!(!update_entity_name(&conn, &EntityId::new("sk/0"), "Nobody").unwrap());
    }
}
