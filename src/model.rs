use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManuscriptEntry {
    pub filename: String,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManuscriptInventory {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub min_bytes: u64,
    pub manuscript_count: usize,
    pub manuscripts: Vec<ManuscriptEntry>,
    pub skipped_small: Vec<String>,
}

/// Manuscript row written at the start of each per-manuscript transaction.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ManuscriptRecord {
    pub filename: String,
    pub author: String,
    pub title: String,
    pub year: Option<i32>,
    pub source_url: Option<String>,
    pub category: String,
    pub sha256: String,
    pub rules_version: String,
}

/// One recognised citation with its passage window, in code points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CitationOccurrence {
    pub book: String,
    pub book_slug: String,
    pub chapter: u32,
    pub verse_start: Option<u32>,
    pub verse_end: Option<u32>,
    pub citation_offset: usize,
    pub passage_start_offset: usize,
    pub passage_end_offset: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoredOccurrence {
    pub id: i64,
    pub manuscript_id: i64,
    #[serde(flatten)]
    pub occurrence: CitationOccurrence,
}

/// A stored occurrence joined with the manuscript it came from.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChapterCitation {
    #[serde(flatten)]
    pub stored: StoredOccurrence,
    pub filename: String,
    pub author: String,
    pub title: String,
    pub year: Option<i32>,
    pub source_url: Option<String>,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub manuscripts: i64,
    pub occurrences: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChapterCount {
    pub book: String,
    pub book_slug: String,
    pub chapter: u32,
    pub occurrences: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
pub struct StoreTotals {
    pub manuscripts: i64,
    pub occurrences: i64,
    pub books_cited: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestPaths {
    pub data_root: String,
    pub manuscripts_dir: String,
    pub db_path: String,
    pub catalog_path: Option<String>,
    pub summary_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct IngestCounts {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_skipped_unchanged: usize,
    pub files_failed: usize,
    pub occurrences_stored: usize,
    pub occurrences_dropped: usize,
    pub dropped_by_reason: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Stored,
    DryRun,
    SkippedUnchanged,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub filename: String,
    pub status: FileStatus,
    pub occurrences: usize,
    pub dropped: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunSummary {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub rules_version: String,
    pub status: String,
    pub dry_run: bool,
    pub started_at: String,
    pub updated_at: String,
    pub paths: IngestPaths,
    pub counts: IngestCounts,
    pub files: Vec<FileOutcome>,
    pub warnings: Vec<String>,
}
