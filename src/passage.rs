use anyhow::{Context, Result};
use regex::Regex;

use crate::error::CitationError;
use crate::text::SourceText;

/// Rendered passages are cut after this many characters.
pub const MAX_PASSAGE_CHARS: usize = 8000;

/// Turns stored passage offsets into display text.
pub struct PassageRenderer {
    blank_runs: Regex,
}

impl PassageRenderer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            blank_runs: Regex::new(r"(?:\r?\n){3,}").context("failed to compile blank line regex")?,
        })
    }

    /// Slices `start..end` (code points, clamped to the text), trims it,
    /// collapses runs of three or more line breaks and caps the length.
    pub fn render(&self, source: &SourceText<'_>, start: usize, end: usize) -> String {
        let slice = source.slice_chars(start, end).trim();
        let collapsed = self.blank_runs.replace_all(slice, "\n\n");
        match collapsed.char_indices().nth(MAX_PASSAGE_CHARS) {
            Some((cut, _)) => collapsed[..cut].to_string(),
            None => collapsed.into_owned(),
        }
    }
}

pub fn missing_source_placeholder(filename: &str) -> String {
    let error = CitationError::MissingSourceFile {
        filename: filename.to_string(),
    };
    format!("[{error}]")
}

/// `None` for chapter-only citations, `"13"` or `"13-17"` otherwise.
pub fn verse_label(verse_start: Option<u32>, verse_end: Option<u32>) -> Option<String> {
    match (verse_start, verse_end) {
        (Some(start), Some(end)) if end != start => Some(format!("{start}-{end}")),
        (Some(start), _) => Some(start.to_string()),
        (None, _) => None,
    }
}

/// Human readable reference such as "Romans 8:13-17" or "Psalms 27".
pub fn reference_label(
    book: &str,
    chapter: u32,
    verse_start: Option<u32>,
    verse_end: Option<u32>,
) -> String {
    match verse_label(verse_start, verse_end) {
        Some(verses) => format!("{book} {chapter}:{verses}"),
        None => format!("{book} {chapter}"),
    }
}
