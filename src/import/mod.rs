//! Register import: JSON documents of entities and ownership relationships.
//!
//! Stands in for the per-jurisdiction pipelines. Entities sharing a key are
//! merged into one node before any edge reaches the graph.

pub mod records;
pub mod writer;

pub use records::{EntityRecord, EntityRef, ImportDocument, RelationshipRecord};
pub use writer::{entity_exists, update_entity_name, upsert_entity, upsert_relationship};

use chrono::Utc;
use rusqlite::Connection;

use crate::model::{Provenance, Relationship};
use crate::Result;

/// Counts reported after an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub entities: usize,
    pub relationships: usize,
    pub skipped: usize,
}

/// Write a whole document in one transaction.
///
/// Invalid records are skipped and counted; database failures abort the
/// import and roll it back. Records without ids get keys derived from their
/// position in the document, so importing the same document again updates
/// rows in place.
pub fn import_document(conn: &mut Connection, doc: &ImportDocument) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let tx = conn.transaction()?;
    let scope = doc.source_key();

    for (index, record) in doc.entities.iter().enumerate() {
        match record.to_entity(scope, index) {
            Ok(entity) => {
                upsert_entity(&tx, &entity)?;
                summary.entities += 1;
            }
            Err(e) => {
                log::warn!("Skipping entity record {}: {}", index, e);
                summary.skipped += 1;
            }
        }
    }

    let provenance = Provenance {
        source_url: doc.source_url.clone(),
        source_name: doc.source_name.clone(),
        retrieved_at: doc.retrieved_at,
        imported_at: Some(Utc::now()),
    };

    for (index, record) in doc.relationships.iter().enumerate() {
        let (Some(source), Some(target)) = (&record.source, &record.target) else {
            log::warn!("Skipping relationship record {}: missing source or target", index);
            summary.skipped += 1;
            continue;
        };
        let (source, target) = (source.resolve(), target.resolve());

        let mut missing = None;
        for id in [&source, &target] {
            if !entity_exists(&tx, id)? {
                missing = Some(id.clone());
                break;
            }
        }
        if let Some(missing) = missing {
            log::warn!("Skipping relationship record {}: unknown entity {}", index, missing);
            summary.skipped += 1;
            continue;
        }

        let relationship = Relationship {
            id: record.resolve_id(scope, index, &source, &target),
            source,
            target,
            started_date: record.started_date.clone(),
            ended_date: record.ended_date.clone(),
            provenance: Some(provenance.clone()),
        };
        upsert_relationship(&tx, &relationship)?;
        summary.relationships += 1;
    }

    tx.commit()?;

    log::info!(
        "Imported {} entities and {} relationships from {} ({} skipped)",
        summary.entities,
        summary.relationships,
        doc.source_name.as_deref().unwrap_or("unnamed source"),
        summary.skipped
    );
    Ok(summary)
}
