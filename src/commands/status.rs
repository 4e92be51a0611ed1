use std::fs;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::ManuscriptInventory;
use crate::passage::reference_label;
use crate::store::ReferenceStore;

pub const DEFAULT_TOP_CHAPTERS: usize = 20;

pub fn run(args: StatusArgs) -> Result<()> {
    let inventory_path = args
        .data_root
        .join("manifests")
        .join("manuscript_inventory.json");
    let db_path = args.db_path();

    info!(data_root = %args.data_root.display(), "status requested");

    if inventory_path.exists() {
        let raw = fs::read(&inventory_path)
            .with_context(|| format!("failed to read {}", inventory_path.display()))?;
        let inventory: ManuscriptInventory = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", inventory_path.display()))?;

        info!(
            generated_at = %inventory.generated_at,
            manuscript_count = inventory.manuscript_count,
            skipped_small = inventory.skipped_small.len(),
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    if db_path.exists() {
        let store = ReferenceStore::open(&db_path)?;
        info!(path = %db_path.display(), "database found");
        log_store_status(&store, args.top)?;
        if let Some(filename) = &args.manuscript {
            log_manuscript_status(&store, filename)?;
        }
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

pub fn log_store_status(store: &ReferenceStore, top: usize) -> Result<()> {
    let totals = store.totals()?;
    info!(
        manuscripts = totals.manuscripts,
        occurrences = totals.occurrences,
        books_cited = totals.books_cited,
        schema_version = %store.metadata_value("db_schema_version")?.unwrap_or_default(),
        updated_at = %store.metadata_value("db_updated_at")?.unwrap_or_default(),
        "database status"
    );

    for category in store.category_counts()? {
        info!(
            category = %category.category,
            manuscripts = category.manuscripts,
            occurrences = category.occurrences,
            "category"
        );
    }

    for (rank, chapter) in store.top_chapters(top)?.iter().enumerate() {
        info!(
            rank = rank + 1,
            book = %chapter.book,
            chapter = chapter.chapter,
            occurrences = chapter.occurrences,
            "most cited chapter"
        );
    }

    Ok(())
}

pub fn log_manuscript_status(store: &ReferenceStore, filename: &str) -> Result<()> {
    let Some(fingerprint) = store.ingest_fingerprint(filename)? else {
        bail!("manuscript not ingested: {filename}");
    };
    let Some(manuscript_id) = store.manuscript_id(filename)? else {
        bail!("manuscript not ingested: {filename}");
    };
    let occurrences = store.manuscript_occurrences(manuscript_id)?;

    let ingested_at = fingerprint
        .ingested_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_default();
    info!(
        filename,
        manuscript_id,
        sha256 = fingerprint.sha256.as_deref().unwrap_or_default(),
        rules_version = fingerprint.rules_version.as_deref().unwrap_or_default(),
        ingested_at = %ingested_at,
        occurrences = occurrences.len(),
        "manuscript status"
    );

    for stored in &occurrences {
        let occurrence = &stored.occurrence;
        info!(
            offset = occurrence.citation_offset,
            reference = %reference_label(
                &occurrence.book,
                occurrence.chapter,
                occurrence.verse_start,
                occurrence.verse_end,
            ),
            passage_start = occurrence.passage_start_offset,
            passage_end = occurrence.passage_end_offset,
            "stored citation"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CitationOccurrence, ManuscriptRecord};

    #[test]
    fn manuscript_status_requires_an_ingested_manuscript() {
        let mut store = ReferenceStore::open_in_memory().expect("store");
        assert!(log_manuscript_status(&store, "owen.txt").is_err());

        let record = ManuscriptRecord {
            filename: "owen.txt".to_string(),
            author: "John Owen".to_string(),
            title: "Mortification".to_string(),
            year: None,
            source_url: None,
            category: "Puritan".to_string(),
            sha256: "abc".to_string(),
            rules_version: "2".to_string(),
        };
        let mut writer = store.begin_manuscript(&record).expect("begin");
        writer
            .record(&CitationOccurrence {
                book: "Romans".to_string(),
                book_slug: "romans".to_string(),
                chapter: 8,
                verse_start: Some(13),
                verse_end: None,
                citation_offset: 4,
                passage_start_offset: 0,
                passage_end_offset: 20,
            })
            .expect("record");
        writer.commit().expect("commit");

        log_manuscript_status(&store, "owen.txt").expect("status");
        log_store_status(&store, DEFAULT_TOP_CHAPTERS).expect("store status");
    }
}
