use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::CitationError;
use crate::resolver::{Resolver, roman_to_int};
use crate::text::SourceText;

/// Paragraphs with at most this many sentences are shown whole.
pub const MAX_WINDOW_SENTENCES: usize = 10;
/// Sentences kept before the citation sentence in a trimmed window; the
/// remaining four come after it.
pub const SENTENCES_BEFORE: usize = 5;

const CLOSERS: &[char] = &['"', '\'', '’', '”', ')', ']'];

/// Code-point bounds of the excerpt shown around a citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PassageWindow {
    pub start: usize,
    pub end: usize,
}

pub struct PassageWindower<'r> {
    resolver: &'r Resolver,
    paragraph_break: Regex,
    terminator: Regex,
}

impl<'r> PassageWindower<'r> {
    pub fn new(resolver: &'r Resolver) -> Result<Self> {
        Ok(Self {
            resolver,
            paragraph_break: Regex::new(r"\r?\n(?:[ \t]*\r?\n)+")
                .context("failed to compile paragraph break regex")?,
            terminator: Regex::new(r#"[.!?]+["'’”)\]]*"#)
                .context("failed to compile sentence terminator regex")?,
        })
    }

    /// Splits the text into paragraphs once so that many citations in the
    /// same manuscript can be windowed cheaply.
    pub fn prepare<'a>(&'a self, source: &'a SourceText<'a>) -> TextWindows<'a> {
        let text = source.as_str();
        let mut paragraphs = Vec::new();
        let mut start = 0;
        for separator in self.paragraph_break.find_iter(text) {
            paragraphs.push((start, separator.start()));
            start = separator.end();
        }
        paragraphs.push((start, text.len()));

        TextWindows {
            windower: self,
            source,
            paragraphs,
            cached: None,
        }
    }

    pub fn window(&self, source: &SourceText<'_>, citation_offset: usize) -> PassageWindow {
        self.prepare(source).window_for(citation_offset)
    }

    /// Byte spans of the sentences of one paragraph. The first span starts at
    /// the paragraph start and the last one runs to the paragraph end, so the
    /// spans cover all non-whitespace text.
    pub fn sentence_spans(&self, paragraph: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut start = 0;

        for terminator in self.terminator.find_iter(paragraph) {
            let end = terminator.end();
            if end <= start {
                continue;
            }
            let followed_by_break = paragraph[end..]
                .chars()
                .next()
                .is_none_or(char::is_whitespace);
            if !followed_by_break {
                continue;
            }
            if terminator.as_str().trim_end_matches(CLOSERS) == "."
                && self.is_abbreviation_period(&paragraph[..terminator.start()])
            {
                continue;
            }

            spans.push((start, end));
            let rest = &paragraph[end..];
            start = end + (rest.len() - rest.trim_start().len());
        }

        if start < paragraph.len() || spans.is_empty() {
            spans.push((start, paragraph.len()));
        } else if let Some(last) = spans.last_mut() {
            last.1 = paragraph.len();
        }

        spans
    }

    /// Whether a period placed right after `before` belongs to an
    /// abbreviation or to the chapter number of a citation.
    fn is_abbreviation_period(&self, before: &str) -> bool {
        let word = trailing_word(before);
        if word.is_empty() {
            return false;
        }

        let is_initial = word.chars().count() == 1 && word.chars().all(char::is_uppercase);
        if word.chars().all(char::is_alphabetic)
            && (is_initial || self.resolver.is_abbreviation_word(word))
        {
            return true;
        }

        let is_chapter_token = (word.len() <= 3 && word.bytes().all(|b| b.is_ascii_digit()))
            || (word.chars().all(|ch| ch.is_ascii_lowercase()) && roman_to_int(word).is_some());
        if !is_chapter_token {
            return false;
        }

        let earlier = before[..before.len() - word.len()]
            .trim_end_matches(|ch: char| ch.is_whitespace() || ch == '.');
        let previous = trailing_word(earlier);
        !previous.is_empty()
            && (self.resolver.is_abbreviation_word(previous) || self.resolver.is_alias(previous))
    }
}

fn trailing_word(text: &str) -> &str {
    let start = text
        .char_indices()
        .rev()
        .take_while(|(_, ch)| ch.is_alphanumeric())
        .last()
        .map_or(text.len(), |(index, _)| index);
    &text[start..]
}

/// Window computation over one prepared manuscript.
pub struct TextWindows<'a> {
    windower: &'a PassageWindower<'a>,
    source: &'a SourceText<'a>,
    paragraphs: Vec<(usize, usize)>,
    cached: Option<(usize, Vec<(usize, usize)>)>,
}

impl TextWindows<'_> {
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Returns the passage window for a citation at `citation_offset`
    /// (code points).
    pub fn window_for(&mut self, citation_offset: usize) -> PassageWindow {
        let len = self.source.char_len();
        let citation = citation_offset.min(len);
        let byte = self.source.byte_offset(citation);

        let index = self
            .paragraphs
            .partition_point(|(start, _)| *start <= byte)
            .saturating_sub(1);
        let (paragraph_start, paragraph_end) = self.paragraphs[index];

        if self.cached.as_ref().is_none_or(|(cached, _)| *cached != index) {
            let paragraph = &self.source.as_str()[paragraph_start..paragraph_end];
            self.cached = Some((index, self.windower.sentence_spans(paragraph)));
        }
        let sentences = self
            .cached
            .as_ref()
            .map(|(_, spans)| spans.as_slice())
            .unwrap_or_default();

        let (start_byte, end_byte) = if sentences.len() <= MAX_WINDOW_SENTENCES {
            (paragraph_start, paragraph_end)
        } else {
            let relative = byte.saturating_sub(paragraph_start);
            let current = sentences
                .partition_point(|(start, _)| *start <= relative)
                .saturating_sub(1);
            let last = (current.saturating_sub(SENTENCES_BEFORE) + MAX_WINDOW_SENTENCES)
                .min(sentences.len());
            let first = last - MAX_WINDOW_SENTENCES;
            (
                paragraph_start + sentences[first].0,
                paragraph_start + sentences[last - 1].1,
            )
        };

        clamp_window(
            self.source.char_offset(start_byte),
            self.source.char_offset(end_byte),
            citation,
            len,
        )
    }
}

/// Forces `0 <= start <= citation <= end <= len`. A window left inverted by
/// clamping collapses onto the citation offset.
pub fn clamp_window(start: usize, end: usize, citation_offset: usize, len: usize) -> PassageWindow {
    let citation = citation_offset.min(len);
    let mut window = PassageWindow {
        start: start.min(len),
        end: end.min(len),
    };
    if window.start > window.end {
        window = PassageWindow {
            start: citation,
            end: citation,
        };
    }
    window.start = window.start.min(citation);
    window.end = window.end.max(citation);

    if window.start != start || window.end != end {
        debug!(
            error = %CitationError::OffsetOutOfRange { start, end, len },
            clamped_start = window.start,
            clamped_end = window.end,
            "clamped passage window"
        );
    }

    window
}
