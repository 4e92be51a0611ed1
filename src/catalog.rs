use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::category::{Categorizer, CategoryInput};

/// Only the beginning of a manuscript is searched for a header.
const HEADER_SEARCH_CHARS: usize = 4000;
const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManuscriptMetadata {
    pub author: String,
    pub title: String,
    pub year: Option<i32>,
    pub source_url: Option<String>,
    pub category: String,
}

/// Bibliographic data for manuscripts keyed by filename.
#[derive(Debug)]
pub struct ManuscriptCatalog {
    entries: HashMap<String, CatalogEntry>,
    header: HeaderParser,
    categorizer: Categorizer,
}

impl ManuscriptCatalog {
    pub fn new(entries: HashMap<String, CatalogEntry>) -> Result<Self> {
        Ok(Self {
            entries,
            header: HeaderParser::new()?,
            categorizer: Categorizer::new()?,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let entries: HashMap<String, CatalogEntry> = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Catalogue fields win; gaps are filled from the text header, then
    /// from the filename. Without a catalogue category one is derived from
    /// the header subjects and the resolved author, title and year.
    pub fn describe(&self, filename: &str, text: &str) -> ManuscriptMetadata {
        let entry = self.entries.get(filename).cloned().unwrap_or_default();
        let header = if entry.author.is_some() && entry.title.is_some() && entry.category.is_some() {
            HeaderFields::default()
        } else {
            self.header.parse(text)
        };

        let author = entry
            .author
            .or(header.author)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        let title = entry
            .title
            .or(header.title)
            .unwrap_or_else(|| title_from_filename(filename));
        let category = entry.category.unwrap_or_else(|| {
            self.categorizer
                .categorize(&CategoryInput {
                    filename,
                    author: &author,
                    title: &title,
                    year: entry.year,
                    subjects: &header.subjects,
                })
                .as_str()
                .to_string()
        });

        ManuscriptMetadata {
            author,
            title,
            year: entry.year,
            source_url: entry.source_url,
            category,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct HeaderFields {
    author: Option<String>,
    title: Option<String>,
    subjects: BTreeSet<String>,
}

/// Reads the `Title:`, `Creator(s):` and `CCEL Subjects:` lines of a
/// plain-text library header framed by two underscore rules.
#[derive(Debug)]
struct HeaderParser {
    rule: Regex,
    title: Regex,
    creator: Regex,
    subjects: Regex,
    life_dates: Regex,
}

impl HeaderParser {
    fn new() -> Result<Self> {
        Ok(Self {
            rule: Regex::new(r"(?m)^\s*_{10,}\s*$").context("failed to compile header rule regex")?,
            title: Regex::new(r"(?m)^\s*Title:\s*(.+?)\s*$")
                .context("failed to compile header title regex")?,
            creator: Regex::new(r"(?m)^\s*Creator\(s\):\s*(.+?)\s*$")
                .context("failed to compile header creator regex")?,
            subjects: Regex::new(r"(?mi)^\s*CCEL Subjects:\s*(.+?)\s*$")
                .context("failed to compile header subjects regex")?,
            life_dates: Regex::new(r"\s*\([^)]*\)").context("failed to compile life dates regex")?,
        })
    }

    fn parse(&self, text: &str) -> HeaderFields {
        let head = match text.char_indices().nth(HEADER_SEARCH_CHARS) {
            Some((index, _)) => &text[..index],
            None => text,
        };

        let mut rules = self.rule.find_iter(head);
        let (Some(first), Some(second)) = (rules.next(), rules.next()) else {
            return HeaderFields::default();
        };
        let block = &head[first.end()..second.start()];

        let capture = |pattern: &Regex| {
            pattern
                .captures(block)
                .and_then(|captures| captures.get(1))
                .map(|value| value.as_str().to_string())
                .filter(|value| !value.is_empty())
        };

        HeaderFields {
            title: capture(&self.title),
            author: capture(&self.creator).map(|creator| self.normalize_creator(&creator)),
            subjects: capture(&self.subjects)
                .map(|raw| {
                    raw.split(';')
                        .map(|subject| subject.trim().to_lowercase())
                        .filter(|subject| !subject.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// "Owen, John (1616-1683)" becomes "John Owen".
    fn normalize_creator(&self, raw: &str) -> String {
        let stripped = self.life_dates.replace_all(raw, "");
        let stripped = stripped.trim().trim_end_matches(',').trim();
        match stripped.split_once(',') {
            Some((last, first)) if !first.trim().is_empty() => {
                format!("{} {}", first.trim(), last.trim())
            }
            _ => stripped.to_string(),
        }
    }
}

fn title_from_filename(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
        .replace(['_', '-'], " ")
}
