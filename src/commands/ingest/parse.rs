use super::*;

/// Everything ingest learned about one manuscript before touching the store.
#[derive(Debug)]
pub(super) struct ParsedManuscript {
    pub(super) filename: String,
    pub(super) sha256: String,
    pub(super) metadata: ManuscriptMetadata,
    pub(super) occurrences: Vec<CitationOccurrence>,
    pub(super) dropped: Vec<DroppedCitation>,
    /// One per occurrence, filled only when matches are going to be logged.
    pub(super) previews: Vec<MatchPreview>,
}

#[derive(Debug)]
pub(super) struct MatchPreview {
    pub(super) reference: String,
    pub(super) form: &'static str,
    pub(super) clause: &'static str,
    pub(super) passage: String,
}

impl ParsedManuscript {
    pub(super) fn record(&self) -> ManuscriptRecord {
        ManuscriptRecord {
            filename: self.filename.clone(),
            author: self.metadata.author.clone(),
            title: self.metadata.title.clone(),
            year: self.metadata.year,
            source_url: self.metadata.source_url.clone(),
            category: self.metadata.category.clone(),
            sha256: self.sha256.clone(),
            rules_version: RULES_VERSION.to_string(),
        }
    }
}

#[derive(Debug)]
pub(super) enum ParseOutcome {
    Unchanged { filename: String },
    Parsed(ParsedManuscript),
}

/// Scanner, windower and catalogue shared read-only by the parser threads.
pub(super) struct ManuscriptParser<'a> {
    scanner: CitationScanner<'a>,
    windower: PassageWindower<'a>,
    catalog: &'a ManuscriptCatalog,
    collect_previews: bool,
}

impl<'a> ManuscriptParser<'a> {
    pub(super) fn new(
        resolver: &'a Resolver,
        catalog: &'a ManuscriptCatalog,
        collect_previews: bool,
    ) -> Result<Self> {
        Ok(Self {
            scanner: CitationScanner::new(resolver)?,
            windower: PassageWindower::new(resolver)?,
            catalog,
            collect_previews,
        })
    }

    /// Reads and parses one file. Returns [`ParseOutcome::Unchanged`] when
    /// the stored fingerprint matches the file's hash and the current rules.
    pub(super) fn parse_file(
        &self,
        path: &Path,
        fingerprints: &HashMap<String, IngestFingerprint>,
    ) -> Result<ParseOutcome> {
        let filename = display_filename(path);
        let (text, sha256) = read_manuscript(path)?;

        if fingerprints
            .get(&filename)
            .is_some_and(|fingerprint| fingerprint.matches(&sha256, RULES_VERSION))
        {
            return Ok(ParseOutcome::Unchanged { filename });
        }

        Ok(ParseOutcome::Parsed(self.parse_text(filename, &text, sha256)))
    }

    pub(super) fn parse_text(&self, filename: String, text: &str, sha256: String) -> ParsedManuscript {
        let source = SourceText::new(text);
        let scan = self.scanner.scan(&source);
        let mut windows = self.windower.prepare(&source);

        let mut occurrences = Vec::with_capacity(scan.citations.len());
        let mut previews = Vec::new();
        for citation in &scan.citations {
            let window = windows.window_for(citation.offset);
            if self.collect_previews {
                previews.push(MatchPreview {
                    reference: citation.label(),
                    form: citation.form.as_str(),
                    clause: citation.clause.as_str(),
                    passage: preview(&source, window),
                });
            }
            occurrences.push(occurrence_for(citation, window));
        }
        debug!(
            filename = %filename,
            paragraphs = windows.paragraph_count(),
            citations = occurrences.len(),
            "windowed manuscript"
        );

        ParsedManuscript {
            metadata: self.catalog.describe(&filename, text),
            filename,
            sha256,
            occurrences,
            dropped: scan.dropped,
            previews,
        }
    }
}

pub(super) fn occurrence_for(citation: &Citation, window: PassageWindow) -> CitationOccurrence {
    CitationOccurrence {
        book: citation.book.name.to_string(),
        book_slug: citation.book.slug.to_string(),
        chapter: citation.chapter,
        verse_start: citation.verse_start,
        verse_end: citation.verse_end,
        citation_offset: citation.offset,
        passage_start_offset: window.start,
        passage_end_offset: window.end,
    }
}

pub(super) fn display_filename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn preview(source: &SourceText<'_>, window: PassageWindow) -> String {
    let end = window.end.min(window.start + PREVIEW_CHARS);
    source
        .slice_chars(window.start, end)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
