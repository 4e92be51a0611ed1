use thiserror::Error;

/// Recoverable problems met while recognising or rendering citations.
///
/// None of these abort a run. Scanner variants drop the candidate occurrence,
/// window variants are clamped, and a missing source file is replaced by a
/// placeholder passage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CitationError {
    #[error("unresolved book name '{name}'")]
    UnresolvedBookName { name: String },

    #[error("malformed chapter/verse number '{token}'")]
    MalformedChapterVerseNumber { token: String },

    #[error("capital numeral '{token}' reads as a pronoun or initial, not a chapter")]
    AmbiguousChapterNumeral { token: String },

    #[error("chapter {chapter} is outside 1..={chapter_count} for {book}")]
    ChapterOutOfRange {
        book: &'static str,
        chapter: u32,
        chapter_count: u32,
    },

    #[error("passage window {start}..{end} falls outside text of length {len}")]
    OffsetOutOfRange { start: usize, end: usize, len: usize },

    #[error("source file not found: {filename}")]
    MissingSourceFile { filename: String },

    #[error("unknown book slug '{slug}'")]
    UnknownBookSlug { slug: String },
}

impl CitationError {
    /// Stable snake_case key used in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnresolvedBookName { .. } => "unresolved_book_name",
            Self::MalformedChapterVerseNumber { .. } => "malformed_chapter_verse_number",
            Self::AmbiguousChapterNumeral { .. } => "ambiguous_chapter_numeral",
            Self::ChapterOutOfRange { .. } => "chapter_out_of_range",
            Self::OffsetOutOfRange { .. } => "offset_out_of_range",
            Self::MissingSourceFile { .. } => "missing_source_file",
            Self::UnknownBookSlug { .. } => "unknown_book_slug",
        }
    }
}
