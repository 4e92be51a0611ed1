use anyhow::{Context, Result};
use regex::{Captures, Regex, RegexBuilder};

use crate::books::{self, BookDefinition};
use crate::error::CitationError;
use crate::passage::reference_label;
use crate::resolver::{BookForm, Resolver, roman_to_int};
use crate::text::SourceText;

#[cfg(test)]
mod tests;

const BOOK_SEPARATOR: &str = r"(?:(?P<dot>\.)\s*|\s+)";
const CHAPTER: &str = r"(?P<chapter>[0-9]{1,3}|[ivxlcdmj]+)\b";
const VERSE_SEPARATOR: &str = r"(?:\s*[.:]\s*|\s+)";
const VERSE_ELEMENT: &str = r"[0-9]{1,3}\b(?:\s*[-–—]\s*[0-9]{1,3}\b)?";
const RANGE_DASHES: [char; 3] = ['-', '–', '—'];

/// Verse clause that follows the chapter number.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VerseClause {
    List,
    Range,
    Single,
    ChapterOnly,
}

impl VerseClause {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "verse_list",
            Self::Range => "verse_range",
            Self::Single => "single_verse",
            Self::ChapterOnly => "chapter_only",
        }
    }
}

/// A recognised citation before windowing. Offsets are code points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub book: &'static BookDefinition,
    pub chapter: u32,
    pub verse_start: Option<u32>,
    pub verse_end: Option<u32>,
    pub offset: usize,
    pub end_offset: usize,
    pub form: BookForm,
    pub clause: VerseClause,
}

impl Citation {
    pub fn label(&self) -> String {
        reference_label(self.book.name, self.chapter, self.verse_start, self.verse_end)
    }
}

/// A citation-shaped span that was not turned into an occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedCitation {
    pub offset: usize,
    pub raw: String,
    pub error: CitationError,
}

#[derive(Debug, Default)]
pub struct ScanOutput {
    pub citations: Vec<Citation>,
    pub dropped: Vec<DroppedCitation>,
}

struct VerseTemplate {
    clause: VerseClause,
    pattern: Regex,
}

struct ShapeMatch {
    start: usize,
    end: usize,
    book: String,
}

/// Finds scripture citations in manuscript text.
///
/// A single alternation over every alias locates candidate book names and
/// tells which form (saint-prefixed, full name, abbreviation) was written.
/// The verse-clause templates are then tried in priority order against the
/// text that follows the name; the first one that matches consumes its span.
/// A separate shape matcher catches citation-looking text whose book name
/// is not in the alias table so it can be reported.
pub struct CitationScanner<'r> {
    resolver: &'r Resolver,
    book_head: Regex,
    /// `book_head` anchored at the start of the haystack.
    leading_book_head: Regex,
    templates: Vec<VerseTemplate>,
    unresolved_shape: Regex,
}

impl<'r> CitationScanner<'r> {
    pub fn new(resolver: &'r Resolver) -> Result<Self> {
        let saint = alias_alternation(&resolver.aliases_for(BookForm::SaintPrefixed));
        let full = alias_alternation(&resolver.aliases_for(BookForm::FullName));
        let abbreviated = alias_alternation(&resolver.aliases_for(BookForm::Abbreviation));

        let head_pattern = format!(
            r"\b(?:(?P<saint>(?:saint|st\.?)\s+(?:{saint}))|(?P<full>{full})|(?P<abbr>{abbreviated}))\b"
        );
        let book_head = RegexBuilder::new(&head_pattern)
            .case_insensitive(true)
            .size_limit(1 << 26)
            .build()
            .context("failed to compile book name regex")?;
        let leading_book_head = RegexBuilder::new(&format!("^{head_pattern}"))
            .case_insensitive(true)
            .size_limit(1 << 26)
            .build()
            .context("failed to compile leading book name regex")?;

        let templates = vec![
            VerseTemplate {
                clause: VerseClause::List,
                pattern: Regex::new(&format!(
                    r"(?i)^{BOOK_SEPARATOR}{CHAPTER}{VERSE_SEPARATOR}(?P<verses>{VERSE_ELEMENT}(?:\s*,\s*{VERSE_ELEMENT})+)"
                ))
                .context("failed to compile verse list template")?,
            },
            VerseTemplate {
                clause: VerseClause::Range,
                pattern: Regex::new(&format!(
                    r"(?i)^{BOOK_SEPARATOR}{CHAPTER}{VERSE_SEPARATOR}(?P<verses>[0-9]{{1,3}}\s*[-–—]\s*[0-9]{{1,3}})\b"
                ))
                .context("failed to compile verse range template")?,
            },
            VerseTemplate {
                clause: VerseClause::Single,
                pattern: Regex::new(&format!(
                    r"(?i)^{BOOK_SEPARATOR}{CHAPTER}{VERSE_SEPARATOR}(?P<verses>[0-9]{{1,3}})\b"
                ))
                .context("failed to compile single verse template")?,
            },
            VerseTemplate {
                clause: VerseClause::ChapterOnly,
                pattern: Regex::new(&format!(r"(?i)^{BOOK_SEPARATOR}{CHAPTER}"))
                    .context("failed to compile chapter template")?,
            },
        ];

        let unresolved_shape = Regex::new(
            r"\b(?P<book>(?:[1-4]\s?)?[A-Z][a-z]{1,11})(?:\.\s*|\s+)(?:[ivxlc]+\.|[0-9]{1,3}:)\s*[0-9]{1,3}\b",
        )
        .context("failed to compile unresolved citation regex")?;

        Ok(Self {
            resolver,
            book_head,
            leading_book_head,
            templates,
            unresolved_shape,
        })
    }

    /// Scans the whole text. Citations come back ordered by offset and never
    /// overlap; a verse list yields one citation per element at the same
    /// offset.
    pub fn scan(&self, source: &SourceText<'_>) -> ScanOutput {
        let text = source.as_str();
        let mut output = ScanOutput::default();
        let mut position = 0;
        let mut shape: Option<ShapeMatch> = None;

        while position < text.len() {
            let head = self.book_head.captures_at(text, position);
            if shape.as_ref().is_none_or(|candidate| candidate.start < position) {
                shape = self.find_shape(text, position);
            }

            let head_start = head
                .as_ref()
                .and_then(|captures| captures.get(0))
                .map(|m| m.start());
            let shape_first = match (head_start, shape.as_ref()) {
                (_, None) => false,
                (None, Some(_)) => true,
                (Some(start), Some(candidate)) => candidate.end <= start,
            };

            if shape_first {
                if let Some(candidate) = shape.take() {
                    position = candidate.end;
                    self.record_unresolved(source, candidate, &mut output);
                }
                continue;
            }

            let Some(head) = head else {
                break;
            };
            position = self.apply_templates(source, &head, &mut output);
        }

        output
    }

    fn find_shape(&self, text: &str, position: usize) -> Option<ShapeMatch> {
        let captures = self.unresolved_shape.captures_at(text, position)?;
        let whole = captures.get(0)?;
        let book = captures.name("book")?;
        Some(ShapeMatch {
            start: whole.start(),
            end: whole.end(),
            book: book.as_str().to_string(),
        })
    }

    fn record_unresolved(
        &self,
        source: &SourceText<'_>,
        candidate: ShapeMatch,
        output: &mut ScanOutput,
    ) {
        if self.resolver.resolve(&candidate.book).is_some() {
            return;
        }
        output.dropped.push(DroppedCitation {
            offset: source.char_offset(candidate.start),
            raw: source.as_str()[candidate.start..candidate.end].to_string(),
            error: CitationError::UnresolvedBookName {
                name: candidate.book,
            },
        });
    }

    /// Tries every verse template after a located book name and returns the
    /// byte position where scanning resumes.
    fn apply_templates(
        &self,
        source: &SourceText<'_>,
        head: &Captures<'_>,
        output: &mut ScanOutput,
    ) -> usize {
        let text = source.as_str();
        let Some(whole) = head.get(0) else {
            return text.len();
        };
        let (form, book_text) = if let Some(m) = head.name("saint") {
            (BookForm::SaintPrefixed, m.as_str())
        } else if let Some(m) = head.name("full") {
            (BookForm::FullName, m.as_str())
        } else {
            (BookForm::Abbreviation, whole.as_str())
        };

        let rest = &text[whole.end()..];
        for template in &self.templates {
            let Some(captures) = template.pattern.captures(rest) else {
                continue;
            };
            let Some(chapter) = captures.name("chapter") else {
                continue;
            };
            let chapter_end = whole.end() + chapter.end();
            if is_capital_roman(chapter.as_str())
                && !capital_chapter_is_plausible(
                    form,
                    captures.name("dot").is_some(),
                    chapter.as_str(),
                    &text[chapter_end..],
                )
            {
                output.dropped.push(DroppedCitation {
                    offset: source.char_offset(whole.start()),
                    raw: text[whole.start()..chapter_end].to_string(),
                    error: CitationError::AmbiguousChapterNumeral {
                        token: chapter.as_str().to_string(),
                    },
                });
                return whole.end();
            }

            let mut clause = template.clause;
            let mut verses = captures.name("verses").map(|m| m.as_str());
            let mut consumed_end = whole.end() + captures.get(0).map_or(0, |m| m.end());
            if clause == VerseClause::List
                && let Some(list) = captures.name("verses")
            {
                let list_start = whole.end() + list.start();
                if let Some(kept) = self.list_before_next_book(text, list_start, list.as_str()) {
                    consumed_end = list_start + kept.len();
                    verses = Some(kept);
                    clause = if kept.contains(',') {
                        VerseClause::List
                    } else if kept.contains(RANGE_DASHES) {
                        VerseClause::Range
                    } else {
                        VerseClause::Single
                    };
                }
            }

            let candidate = Candidate {
                book_text,
                form,
                clause,
                chapter: chapter.as_str(),
                verses,
                offset: source.char_offset(whole.start()),
                end_offset: source.char_offset(consumed_end),
                raw: &text[whole.start()..consumed_end],
            };
            self.build_citations(candidate, output);
            return consumed_end;
        }

        whole.end()
    }

    /// A verse list such as "13, 2 Cor. v. 17" stops before the element that
    /// opens a numbered book. Returns the kept prefix of `list` when cut.
    fn list_before_next_book<'t>(&self, text: &str, list_start: usize, list: &'t str) -> Option<&'t str> {
        let mut element_start = 0;
        for (index, element) in list.split(',').enumerate() {
            if index > 0 {
                let lead = element.len() - element.trim_start().len();
                let at = list_start + element_start + lead;
                if self.leading_book_head.is_match(&text[at..]) {
                    return Some(list[..element_start - 1].trim_end());
                }
            }
            element_start += element.len() + 1;
        }
        None
    }

    fn build_citations(&self, candidate: Candidate<'_>, output: &mut ScanOutput) {
        let reject = |output: &mut ScanOutput, error: CitationError| {
            output.dropped.push(DroppedCitation {
                offset: candidate.offset,
                raw: candidate.raw.to_string(),
                error,
            });
        };

        let Some(book) = self.resolver.resolve(candidate.book_text) else {
            reject(
                output,
                CitationError::UnresolvedBookName {
                    name: candidate.book_text.to_string(),
                },
            );
            return;
        };

        let chapter = match parse_chapter(candidate.chapter)
            .and_then(|chapter| books::validate_chapter(book, chapter).map(|()| chapter))
        {
            Ok(chapter) => chapter,
            Err(error) => {
                reject(output, error);
                return;
            }
        };

        let citation = |verse_start, verse_end| Citation {
            book,
            chapter,
            verse_start,
            verse_end,
            offset: candidate.offset,
            end_offset: candidate.end_offset,
            form: candidate.form,
            clause: candidate.clause,
        };

        let Some(verses) = candidate.verses else {
            output.citations.push(citation(None, None));
            return;
        };

        for element in verses.split(',') {
            match parse_verse_element(element) {
                Ok((start, end)) => output.citations.push(citation(Some(start), end)),
                Err(error) => reject(output, error),
            }
        }
    }
}

struct Candidate<'t> {
    book_text: &'t str,
    form: BookForm,
    clause: VerseClause,
    chapter: &'t str,
    verses: Option<&'t str>,
    offset: usize,
    end_offset: usize,
    raw: &'t str,
}

fn alias_alternation(aliases: &[&str]) -> String {
    aliases
        .iter()
        .map(|alias| {
            alias
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn is_capital_roman(token: &str) -> bool {
    !token.bytes().all(|b| b.is_ascii_digit()) && token.chars().any(|ch| ch.is_ascii_uppercase())
}

/// Capital numerals collide with the pronoun "I" and with initials. One is
/// read as a chapter only when it carries its own period ("Isaiah LIII. 5")
/// or follows a dotted abbreviation ("Rom. VIII 13"). A single letter is
/// refused when it looks like an initial ("Rev. J. C. Ryle") or when the
/// full book name before it closed a sentence ("John. I believe").
fn capital_chapter_is_plausible(form: BookForm, book_dot: bool, chapter: &str, after: &str) -> bool {
    let abbreviated = form == BookForm::Abbreviation && book_dot;
    if chapter.len() == 1 && (starts_with_initial(after) || (book_dot && !abbreviated)) {
        return false;
    }
    after.starts_with('.') || abbreviated
}

/// True for ". C" style continuations: a period, whitespace, a capital.
fn starts_with_initial(after: &str) -> bool {
    after.strip_prefix('.').is_some_and(|rest| {
        let trimmed = rest.trim_start();
        trimmed.len() < rest.len() && trimmed.starts_with(|ch: char| ch.is_uppercase())
    })
}

fn parse_chapter(token: &str) -> Result<u32, CitationError> {
    let malformed = || CitationError::MalformedChapterVerseNumber {
        token: token.to_string(),
    };

    if token.bytes().all(|b| b.is_ascii_digit()) {
        return token.parse::<u32>().map_err(|_| malformed());
    }
    roman_to_int(token).ok_or_else(malformed)
}

/// Parses "13" or "13-17". Equal bounds collapse to a single verse.
fn parse_verse_element(element: &str) -> Result<(u32, Option<u32>), CitationError> {
    let element = element.trim();
    let malformed = || CitationError::MalformedChapterVerseNumber {
        token: element.to_string(),
    };
    let parse = |part: &str| -> Result<u32, CitationError> {
        match part.trim().parse::<u32>() {
            Ok(0) | Err(_) => Err(malformed()),
            Ok(value) => Ok(value),
        }
    };

    match element.split_once(RANGE_DASHES) {
        None => Ok((parse(element)?, None)),
        Some((start, end)) => {
            let start = parse(start)?;
            let end = parse(end)?;
            match end.cmp(&start) {
                std::cmp::Ordering::Less => Err(malformed()),
                std::cmp::Ordering::Equal => Ok((start, None)),
                std::cmp::Ordering::Greater => Ok((start, Some(end))),
            }
        }
    }
}
