use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use tracing::debug;

use crate::books;
use crate::model::{
    CategoryCount, ChapterCitation, ChapterCount, CitationOccurrence, ManuscriptRecord, StoreTotals,
    StoredOccurrence,
};
use crate::util::now_utc_string;

pub const DB_SCHEMA_VERSION: &str = "1.2.0";

/// Every manuscript read by this crate is plain text.
pub const PLAIN_TEXT_SOURCE_FORMAT: &str = "txt";

const UNCATEGORIZED: &str = "Other";

const OCCURRENCE_COLUMNS: &str = "o.id, o.manuscript_id, o.book, o.book_slug, o.chapter, \
     o.verse_start, o.verse_end, o.citation_offset, o.passage_start_offset, o.passage_end_offset";

/// What a manuscript looked like when it was last ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestFingerprint {
    pub sha256: Option<String>,
    pub rules_version: Option<String>,
    pub ingested_at: Option<DateTime<Utc>>,
}

impl IngestFingerprint {
    pub fn matches(&self, sha256: &str, rules_version: &str) -> bool {
        self.sha256.as_deref() == Some(sha256)
            && self.rules_version.as_deref() == Some(rules_version)
    }
}

/// SQLite store for manuscripts and their citation occurrences.
pub struct ReferenceStore {
    connection: Connection,
}

impl ReferenceStore {
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Self::from_connection(connection)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        configure_connection(&connection)?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    /// Starts the all-or-nothing write of one manuscript: the manuscript row
    /// is upserted by filename and its previous occurrences are removed.
    /// Nothing is visible to readers until [`ManuscriptWriter::commit`].
    pub fn begin_manuscript(&mut self, manuscript: &ManuscriptRecord) -> Result<ManuscriptWriter<'_>> {
        let tx = self.connection.transaction()?;

        let manuscript_id: i64 = tx
            .query_row(
                "
                INSERT INTO manuscripts(
                  filename, author, title, year, source_url, category, source_format,
                  sha256, rules_version, ingested_at
                )
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(filename) DO UPDATE SET
                  author=excluded.author,
                  title=excluded.title,
                  year=excluded.year,
                  source_url=excluded.source_url,
                  category=excluded.category,
                  source_format=excluded.source_format,
                  sha256=excluded.sha256,
                  rules_version=excluded.rules_version,
                  ingested_at=excluded.ingested_at
                RETURNING id
                ",
                params![
                    &manuscript.filename,
                    &manuscript.author,
                    &manuscript.title,
                    manuscript.year,
                    &manuscript.source_url,
                    &manuscript.category,
                    PLAIN_TEXT_SOURCE_FORMAT,
                    &manuscript.sha256,
                    &manuscript.rules_version,
                    Utc::now(),
                ],
                |row| row.get(0),
            )
            .with_context(|| format!("failed to upsert manuscript {}", manuscript.filename))?;

        let removed = tx.execute(
            "DELETE FROM citation_occurrences WHERE manuscript_id = ?1",
            [manuscript_id],
        )?;
        debug!(
            filename = %manuscript.filename,
            manuscript_id,
            removed,
            "replacing manuscript occurrences"
        );

        Ok(ManuscriptWriter {
            tx,
            manuscript_id,
            recorded: 0,
        })
    }

    pub fn ingest_fingerprint(&self, filename: &str) -> Result<Option<IngestFingerprint>> {
        let fingerprint = self
            .connection
            .query_row(
                "SELECT sha256, rules_version, ingested_at FROM manuscripts WHERE filename = ?1",
                [filename],
                |row| {
                    Ok(IngestFingerprint {
                        sha256: row.get(0)?,
                        rules_version: row.get(1)?,
                        ingested_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(fingerprint)
    }

    /// Fingerprints of every stored manuscript, keyed by filename.
    pub fn ingest_fingerprints(&self) -> Result<HashMap<String, IngestFingerprint>> {
        let mut statement = self
            .connection
            .prepare("SELECT filename, sha256, rules_version, ingested_at FROM manuscripts")?;
        let rows = statement.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                IngestFingerprint {
                    sha256: row.get(1)?,
                    rules_version: row.get(2)?,
                    ingested_at: row.get(3)?,
                },
            ))
        })?;

        let mut fingerprints = HashMap::new();
        for row in rows {
            let (filename, fingerprint) = row?;
            fingerprints.insert(filename, fingerprint);
        }
        Ok(fingerprints)
    }

    pub fn manuscript_id(&self, filename: &str) -> Result<Option<i64>> {
        let id = self
            .connection
            .query_row(
                "SELECT id FROM manuscripts WHERE filename = ?1",
                [filename],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn totals(&self) -> Result<StoreTotals> {
        Ok(StoreTotals {
            manuscripts: query_count(&self.connection, "SELECT COUNT(*) FROM manuscripts")?,
            occurrences: query_count(&self.connection, "SELECT COUNT(*) FROM citation_occurrences")?,
            books_cited: query_count(
                &self.connection,
                "SELECT COUNT(DISTINCT book_slug) FROM citation_occurrences",
            )?,
        })
    }

    /// Most cited chapters, ties broken by canonical book order.
    pub fn top_chapters(&self, limit: usize) -> Result<Vec<ChapterCount>> {
        let mut statement = self.connection.prepare(
            "
            SELECT book, book_slug, chapter, COUNT(*) AS n
            FROM citation_occurrences
            GROUP BY book_slug, chapter
            ",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(ChapterCount {
                book: row.get(0)?,
                book_slug: row.get(1)?,
                chapter: row.get(2)?,
                occurrences: row.get(3)?,
            })
        })?;

        let mut counts = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        let ordinal = |slug: &str| books::resolve(slug).map_or(u32::MAX, |book| book.ordinal);
        counts.sort_by(|a, b| {
            b.occurrences
                .cmp(&a.occurrences)
                .then_with(|| ordinal(&a.book_slug).cmp(&ordinal(&b.book_slug)))
                .then(a.chapter.cmp(&b.chapter))
        });
        counts.truncate(limit);
        Ok(counts)
    }

    /// Occurrences of one chapter for display: verse order with
    /// chapter-only citations last, then author and title.
    pub fn chapter_citations(&self, book_slug: &str, chapter: u32) -> Result<Vec<ChapterCitation>> {
        let sql = format!(
            "
            SELECT {OCCURRENCE_COLUMNS}, m.filename, m.author, m.title, m.year, m.source_url,
                   COALESCE(m.category, '{UNCATEGORIZED}')
            FROM citation_occurrences o
            JOIN manuscripts m ON m.id = o.manuscript_id
            WHERE o.book_slug = ?1 AND o.chapter = ?2
            ORDER BY o.verse_start IS NULL, o.verse_start, m.author, m.title, o.citation_offset, o.id
            "
        );
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map(params![book_slug, chapter], |row| {
            Ok(ChapterCitation {
                stored: stored_occurrence_from_row(row)?,
                filename: row.get(10)?,
                author: row.get(11)?,
                title: row.get(12)?,
                year: row.get(13)?,
                source_url: row.get(14)?,
                category: row.get(15)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Manuscripts and occurrences per category, largest first.
    pub fn category_counts(&self) -> Result<Vec<CategoryCount>> {
        let sql = format!(
            "
            SELECT COALESCE(m.category, '{UNCATEGORIZED}'), COUNT(DISTINCT m.id), COUNT(o.id)
            FROM manuscripts m
            LEFT JOIN citation_occurrences o ON o.manuscript_id = m.id
            GROUP BY 1
            ORDER BY 3 DESC, 1
            "
        );
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map([], |row| {
            Ok(CategoryCount {
                category: row.get(0)?,
                manuscripts: row.get(1)?,
                occurrences: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn manuscript_occurrences(&self, manuscript_id: i64) -> Result<Vec<StoredOccurrence>> {
        let sql = format!(
            "
            SELECT {OCCURRENCE_COLUMNS}
            FROM citation_occurrences o
            WHERE o.manuscript_id = ?1
            ORDER BY o.citation_offset, o.id
            "
        );
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map([manuscript_id], stored_occurrence_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn metadata_value(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .connection
            .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }
}

/// Open write transaction for a single manuscript. Dropping it without
/// calling [`commit`](Self::commit) rolls every row back.
pub struct ManuscriptWriter<'c> {
    tx: Transaction<'c>,
    manuscript_id: i64,
    recorded: usize,
}

impl ManuscriptWriter<'_> {
    pub fn manuscript_id(&self) -> i64 {
        self.manuscript_id
    }

    pub fn record(&mut self, occurrence: &CitationOccurrence) -> Result<StoredOccurrence> {
        validate_occurrence(occurrence)?;

        self.tx.execute(
            "
            INSERT INTO citation_occurrences(
              manuscript_id, book, book_slug, chapter, verse_start, verse_end,
              citation_offset, passage_start_offset, passage_end_offset
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
            params![
                self.manuscript_id,
                &occurrence.book,
                &occurrence.book_slug,
                occurrence.chapter,
                occurrence.verse_start,
                occurrence.verse_end,
                to_sql_offset(occurrence.citation_offset)?,
                to_sql_offset(occurrence.passage_start_offset)?,
                to_sql_offset(occurrence.passage_end_offset)?,
            ],
        )?;
        self.recorded += 1;

        Ok(StoredOccurrence {
            id: self.tx.last_insert_rowid(),
            manuscript_id: self.manuscript_id,
            occurrence: occurrence.clone(),
        })
    }

    /// Publishes the manuscript and returns how many occurrences it holds.
    pub fn commit(self) -> Result<usize> {
        self.tx.execute(
            "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            [now_utc_string()],
        )?;
        self.tx.commit().context("failed to commit manuscript")?;
        Ok(self.recorded)
    }
}

fn validate_occurrence(occurrence: &CitationOccurrence) -> Result<()> {
    let book = books::resolve(&occurrence.book_slug)?;
    books::validate_chapter(book, occurrence.chapter)?;

    match (occurrence.verse_start, occurrence.verse_end) {
        (None, Some(end)) => bail!("verse_end {end} recorded without verse_start"),
        (Some(start), Some(end)) => ensure!(
            end > start,
            "verse range {start}-{end} must be strictly ascending"
        ),
        _ => {}
    }

    ensure!(
        occurrence.passage_start_offset <= occurrence.citation_offset
            && occurrence.citation_offset <= occurrence.passage_end_offset,
        "passage window {}..{} does not contain citation offset {}",
        occurrence.passage_start_offset,
        occurrence.passage_end_offset,
        occurrence.citation_offset
    );

    Ok(())
}

fn to_sql_offset(offset: usize) -> Result<i64> {
    i64::try_from(offset).with_context(|| format!("offset {offset} does not fit in sqlite"))
}

fn offset_column(row: &Row<'_>, index: usize) -> rusqlite::Result<usize> {
    let value: i64 = row.get(index)?;
    usize::try_from(value)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(err)))
}

fn stored_occurrence_from_row(row: &Row<'_>) -> rusqlite::Result<StoredOccurrence> {
    Ok(StoredOccurrence {
        id: row.get(0)?,
        manuscript_id: row.get(1)?,
        occurrence: CitationOccurrence {
            book: row.get(2)?,
            book_slug: row.get(3)?,
            chapter: row.get(4)?,
            verse_start: row.get(5)?,
            verse_end: row.get(6)?,
            citation_offset: offset_column(row, 7)?,
            passage_start_offset: offset_column(row, 8)?,
            passage_end_offset: offset_column(row, 9)?,
        },
    })
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign_keys")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS manuscripts (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          filename TEXT NOT NULL UNIQUE,
          author TEXT NOT NULL,
          title TEXT NOT NULL,
          year INTEGER,
          source_url TEXT
        );

        CREATE TABLE IF NOT EXISTS citation_occurrences (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          manuscript_id INTEGER NOT NULL,
          book TEXT NOT NULL,
          book_slug TEXT NOT NULL,
          chapter INTEGER NOT NULL,
          verse_start INTEGER,
          verse_end INTEGER,
          citation_offset INTEGER NOT NULL,
          passage_start_offset INTEGER NOT NULL,
          passage_end_offset INTEGER NOT NULL,
          FOREIGN KEY(manuscript_id) REFERENCES manuscripts(id) ON DELETE CASCADE
        );
        ",
    )?;

    ensure_column_exists(connection, "manuscripts", "sha256 TEXT")?;
    ensure_column_exists(connection, "manuscripts", "rules_version TEXT")?;
    ensure_column_exists(connection, "manuscripts", "ingested_at TEXT")?;
    ensure_column_exists(connection, "manuscripts", "category TEXT")?;
    ensure_column_exists(
        connection,
        "manuscripts",
        "source_format TEXT NOT NULL DEFAULT 'txt'",
    )?;

    connection.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_occurrences_book_chapter ON citation_occurrences(book_slug, chapter);
        CREATE INDEX IF NOT EXISTS idx_occurrences_manuscript ON citation_occurrences(manuscript_id);
        ",
    )?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;

    Ok(())
}

fn ensure_column_exists(
    connection: &Connection,
    table_name: &str,
    column_definition: &str,
) -> Result<()> {
    let Some(column_name) = column_definition.split_whitespace().next() else {
        bail!("invalid column definition: {column_definition}");
    };

    let pragma_sql = format!("PRAGMA table_info({table_name})");
    let mut statement = connection
        .prepare(&pragma_sql)
        .with_context(|| format!("failed to inspect schema for table {table_name}"))?;

    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let existing_name: String = row.get(1)?;
        if existing_name == column_name {
            return Ok(());
        }
    }

    let alter_sql = format!("ALTER TABLE {table_name} ADD COLUMN {column_definition}");
    connection
        .execute(&alter_sql, [])
        .with_context(|| format!("failed to add column {column_name} on {table_name}"))?;

    Ok(())
}

fn query_count(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
