use std::fs;

use rayon::ThreadPoolBuilder;

use super::run::ingest_paths;
use super::*;
use crate::model::FileStatus;

const OWEN: &str = "\
Of the Mortification of Sin.

Rom. viii. 13. If ye through the Spirit do mortify the deeds of the body, ye shall live. \
Compare Gal. v. 16, 17 and Job did not sin.
";

const BAXTER: &str = "The saints' rest is promised in Heb. iv. 9 and Ps. xxvii. also.";

fn pool() -> rayon::ThreadPool {
    ThreadPoolBuilder::new().num_threads(2).build().expect("pool")
}

fn catalog() -> ManuscriptCatalog {
    ManuscriptCatalog::new(HashMap::new()).expect("catalog")
}

#[test]
fn parse_text_windows_every_citation() {
    let resolver = Resolver::new();
    let catalog = catalog();
    let parser = ManuscriptParser::new(&resolver, &catalog, true).expect("parser");

    let parsed = parser.parse_text("owen.txt".to_string(), OWEN, "abc".to_string());
    let refs: Vec<(&str, u32, Option<u32>)> = parsed
        .occurrences
        .iter()
        .map(|o| (o.book_slug.as_str(), o.chapter, o.verse_start))
        .collect();
    assert_eq!(
        refs,
        vec![("romans", 8, Some(13)), ("galatians", 5, Some(16)), ("galatians", 5, Some(17))]
    );

    let len = OWEN.chars().count();
    for occurrence in &parsed.occurrences {
        assert!(occurrence.passage_start_offset <= occurrence.citation_offset);
        assert!(occurrence.citation_offset <= occurrence.passage_end_offset);
        assert!(occurrence.passage_end_offset <= len);
    }
    assert_eq!(parsed.occurrences[0].passage_start_offset, "Of the Mortification of Sin.\n\n".len());

    assert_eq!(parsed.dropped.len(), 1);
    assert_eq!(parsed.dropped[0].error.kind(), "malformed_chapter_verse_number");
    assert_eq!(parsed.previews.len(), 3);
    assert_eq!(parsed.previews[0].reference, "Romans 8:13");
    assert_eq!(parsed.previews[0].form, "abbreviation");
    assert_eq!(parsed.previews[1].clause, "verse_list");
    assert_eq!(parsed.record().rules_version, RULES_VERSION);
}

#[test]
fn previews_are_skipped_unless_requested() {
    let resolver = Resolver::new();
    let catalog = catalog();
    let parser = ManuscriptParser::new(&resolver, &catalog, false).expect("parser");
    let parsed = parser.parse_text("baxter.txt".to_string(), BAXTER, "abc".to_string());
    assert_eq!(parsed.occurrences.len(), 2);
    assert!(parsed.previews.is_empty());
}

#[test]
fn ingest_stores_skips_unchanged_and_continues_after_failures() {
    let dir = tempfile::tempdir().expect("tempdir");
    let owen = dir.path().join("owen.txt");
    let baxter = dir.path().join("baxter.txt");
    fs::write(&owen, OWEN).expect("write owen");
    fs::write(&baxter, BAXTER).expect("write baxter");
    let missing = dir.path().join("missing.txt");

    let resolver = Resolver::new();
    let catalog = catalog();
    let parser = ManuscriptParser::new(&resolver, &catalog, false).expect("parser");
    let pool = pool();
    let mut store = ReferenceStore::open_in_memory().expect("store");

    let paths = vec![baxter.clone(), missing, owen.clone()];
    let first = ingest_paths(&pool, &parser, &paths, &HashMap::new(), Some(&mut store));
    assert_eq!(first.counts.files_discovered, 3);
    assert_eq!(first.counts.files_processed, 2);
    assert_eq!(first.counts.files_failed, 1);
    assert_eq!(first.counts.occurrences_stored, 5);
    assert_eq!(first.counts.occurrences_dropped, 1);
    assert_eq!(
        first.counts.dropped_by_reason.get("malformed_chapter_verse_number"),
        Some(&1)
    );
    let statuses: Vec<FileStatus> = first.files.iter().map(|f| f.status).collect();
    assert_eq!(
        statuses,
        vec![FileStatus::Stored, FileStatus::Failed, FileStatus::Stored]
    );
    assert_eq!(store.totals().expect("totals").occurrences, 5);

    fs::write(&owen, format!("{OWEN}\nSee also John iii. 16.\n")).expect("rewrite owen");
    let fingerprints = store.ingest_fingerprints().expect("fingerprints");
    let second = ingest_paths(
        &pool,
        &parser,
        &[baxter, owen],
        &fingerprints,
        Some(&mut store),
    );
    assert_eq!(second.counts.files_skipped_unchanged, 1);
    assert_eq!(second.counts.files_processed, 1);
    assert_eq!(second.counts.occurrences_stored, 4);
    assert_eq!(store.totals().expect("totals").occurrences, 6);
}

#[test]
fn dry_run_parses_without_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let baxter = dir.path().join("baxter.txt");
    fs::write(&baxter, BAXTER).expect("write");

    let resolver = Resolver::new();
    let catalog = catalog();
    let parser = ManuscriptParser::new(&resolver, &catalog, true).expect("parser");
    let report = ingest_paths(&pool(), &parser, &[baxter], &HashMap::new(), None);

    assert_eq!(report.files[0].status, FileStatus::DryRun);
    assert_eq!(report.files[0].occurrences, 2);
    assert_eq!(report.counts.occurrences_stored, 0);
}

#[test]
fn occurrence_for_copies_citation_and_window() {
    let resolver = Resolver::new();
    let scanner = CitationScanner::new(&resolver).expect("scanner");
    let source = SourceText::new("Rom. viii. 13-17");
    let scan = scanner.scan(&source);

    let occurrence = occurrence_for(&scan.citations[0], PassageWindow { start: 0, end: 16 });
    assert_eq!(occurrence.book, "Romans");
    assert_eq!(occurrence.verse_end, Some(17));
    assert_eq!(occurrence.passage_end_offset, 16);
}
