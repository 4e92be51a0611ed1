use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, warn};

use crate::books;
use crate::cli::ShowArgs;
use crate::error::CitationError;
use crate::model::ChapterCitation;
use crate::passage::{PassageRenderer, missing_source_placeholder, reference_label, verse_label};
use crate::store::ReferenceStore;
use crate::text::SourceText;
use crate::util::read_manuscript;

/// Everything a reader needs to browse one chapter.
#[derive(Debug, Serialize)]
pub struct ChapterExport {
    pub book: String,
    pub book_slug: String,
    pub chapter: u32,
    /// Citations of this chapter per manuscript category.
    pub categories: BTreeMap<String, usize>,
    pub passages: Vec<RenderedPassage>,
}

#[derive(Debug, Serialize)]
pub struct RenderedPassage {
    pub reference: String,
    /// Verse labels of every citation sharing this passage.
    pub verses: Vec<String>,
    pub filename: String,
    pub author: String,
    pub title: String,
    pub year: Option<i32>,
    pub source_url: Option<String>,
    pub category: String,
    pub passage_start_offset: usize,
    pub passage_end_offset: usize,
    pub text: String,
}

pub fn run(args: ShowArgs) -> Result<()> {
    let book = books::resolve(&args.book)?;
    books::validate_chapter(book, args.chapter)?;

    let db_path = args.db_path();
    if !db_path.exists() {
        bail!("database not found: {}", db_path.display());
    }
    let store = ReferenceStore::open(&db_path)?;
    let citations = store.chapter_citations(book.slug, args.chapter)?;

    let renderer = PassageRenderer::new()?;
    let export = ChapterExport {
        book: book.name.to_string(),
        book_slug: book.slug.to_string(),
        chapter: args.chapter,
        categories: category_counts(&citations),
        passages: render_chapter(&citations, &args.manuscripts_dir(), &renderer),
    };
    info!(
        book = %export.book,
        chapter = export.chapter,
        citations = citations.len(),
        passages = export.passages.len(),
        "rendered chapter"
    );

    if args.json {
        let json = serde_json::to_string_pretty(&export).context("failed to serialize chapter")?;
        println!("{json}");
    } else {
        print_chapter(&export);
    }

    Ok(())
}

/// Renders the passages of a chapter in store order. Citations of the same
/// passage window in the same manuscript share one entry.
pub fn render_chapter(
    citations: &[ChapterCitation],
    manuscripts_dir: &Path,
    renderer: &PassageRenderer,
) -> Vec<RenderedPassage> {
    let mut texts: HashMap<&str, Option<String>> = HashMap::new();
    for citation in citations {
        texts
            .entry(citation.filename.as_str())
            .or_insert_with(|| load_source(manuscripts_dir, &citation.filename));
    }
    let sources: HashMap<&str, SourceText<'_>> = texts
        .iter()
        .filter_map(|(filename, text)| Some((*filename, SourceText::new(text.as_deref()?))))
        .collect();

    let mut index: HashMap<(&str, usize, usize), usize> = HashMap::new();
    let mut passages: Vec<RenderedPassage> = Vec::new();

    for citation in citations {
        let occurrence = &citation.stored.occurrence;
        let verse = verse_label(occurrence.verse_start, occurrence.verse_end);
        let key = (
            citation.filename.as_str(),
            occurrence.passage_start_offset,
            occurrence.passage_end_offset,
        );

        if let Some(&existing) = index.get(&key) {
            let passage = &mut passages[existing];
            if let Some(verse) = verse
                && !passage.verses.contains(&verse)
            {
                passage.verses.push(verse);
            }
            continue;
        }

        let rendered = match sources.get(citation.filename.as_str()) {
            Some(source) => renderer.render(
                source,
                occurrence.passage_start_offset,
                occurrence.passage_end_offset,
            ),
            None => missing_source_placeholder(&citation.filename),
        };

        index.insert(key, passages.len());
        passages.push(RenderedPassage {
            reference: reference_label(
                &occurrence.book,
                occurrence.chapter,
                occurrence.verse_start,
                occurrence.verse_end,
            ),
            verses: verse.into_iter().collect(),
            filename: citation.filename.clone(),
            author: citation.author.clone(),
            title: citation.title.clone(),
            year: citation.year,
            source_url: citation.source_url.clone(),
            category: citation.category.clone(),
            passage_start_offset: occurrence.passage_start_offset,
            passage_end_offset: occurrence.passage_end_offset,
            text: rendered,
        });
    }

    passages
}

fn category_counts(citations: &[ChapterCitation]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for citation in citations {
        *counts.entry(citation.category.clone()).or_insert(0) += 1;
    }
    counts
}

fn load_source(manuscripts_dir: &Path, filename: &str) -> Option<String> {
    let path = manuscripts_dir.join(filename);
    match read_manuscript(&path) {
        Ok((text, _)) => Some(text),
        Err(err) => {
            let missing = CitationError::MissingSourceFile {
                filename: filename.to_string(),
            };
            let cause = format!("{err:#}");
            warn!(path = %path.display(), error = %missing, cause = %cause, "using placeholder passage");
            None
        }
    }
}

fn print_chapter(export: &ChapterExport) {
    println!("{} {}", export.book, export.chapter);
    for passage in &export.passages {
        let year = passage
            .year
            .map(|year| format!(" ({year})"))
            .unwrap_or_default();
        println!();
        println!("{} | {}, {}{}", passage.reference, passage.author, passage.title, year);
        println!("{}", passage.text);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::model::{CitationOccurrence, StoredOccurrence};

    fn citation(filename: &str, verse: Option<u32>, start: usize, end: usize) -> ChapterCitation {
        ChapterCitation {
            stored: StoredOccurrence {
                id: 1,
                manuscript_id: 1,
                occurrence: CitationOccurrence {
                    book: "Romans".to_string(),
                    book_slug: "romans".to_string(),
                    chapter: 8,
                    verse_start: verse,
                    verse_end: None,
                    citation_offset: start,
                    passage_start_offset: start,
                    passage_end_offset: end,
                },
            },
            filename: filename.to_string(),
            author: "John Owen".to_string(),
            title: "Mortification".to_string(),
            year: Some(1656),
            source_url: None,
            category: "Puritan".to_string(),
        }
    }

    #[test]
    fn shared_windows_merge_and_missing_files_use_placeholder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let text = "Rom. viii. 13, 14 saith so.\n\n\n\nNext paragraph here.";
        fs::write(dir.path().join("owen.txt"), text).expect("write");
        let renderer = PassageRenderer::new().expect("renderer");

        let len = text.chars().count();
        let citations = vec![
            citation("owen.txt", Some(13), 0, len),
            citation("owen.txt", Some(14), 0, len),
            citation("gone.txt", None, 0, 10),
        ];
        let passages = render_chapter(&citations, dir.path(), &renderer);

        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].verses, vec!["13", "14"]);
        assert_eq!(passages[0].reference, "Romans 8:13");
        assert_eq!(passages[0].text, "Rom. viii. 13, 14 saith so.\n\nNext paragraph here.");
        assert!(passages[1].verses.is_empty());
        assert_eq!(passages[1].text, "[source file not found: gone.txt]");
    }

    #[test]
    fn one_source_serves_every_passage_of_a_manuscript() {
        let dir = tempfile::tempdir().expect("tempdir");
        let text = "Première phrase. Rom. viii. 13 suit.\n\nRom. viii. 28 enfin.";
        fs::write(dir.path().join("owen.txt"), text).expect("write");
        let renderer = PassageRenderer::new().expect("renderer");

        let second = text.find("Rom. viii. 28").map(|byte| text[..byte].chars().count()).expect("offset");
        let len = text.chars().count();
        let citations = vec![
            citation("owen.txt", Some(13), 0, 36),
            citation("owen.txt", Some(28), second, len),
        ];
        let passages = render_chapter(&citations, dir.path(), &renderer);

        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].text, "Première phrase. Rom. viii. 13 suit.");
        assert_eq!(passages[1].text, "Rom. viii. 28 enfin.");
        assert_eq!(category_counts(&citations).get("Puritan"), Some(&2));
    }
}
