use super::*;

/// Replaces the stored occurrences of one manuscript in a single
/// transaction. On error nothing from this manuscript is kept.
pub(super) fn store_manuscript(store: &mut ReferenceStore, parsed: &ParsedManuscript) -> Result<usize> {
    let mut writer = store.begin_manuscript(&parsed.record())?;
    for occurrence in &parsed.occurrences {
        writer.record(occurrence).with_context(|| {
            format!(
                "failed to record occurrence at offset {} in {}",
                occurrence.citation_offset, parsed.filename
            )
        })?;
    }
    let manuscript_id = writer.manuscript_id();
    let stored = writer.commit()?;

    debug!(filename = %parsed.filename, manuscript_id, stored, "stored manuscript occurrences");
    Ok(stored)
}

/// Logs every drop at debug level and every match when requested.
pub(super) fn log_parsed(parsed: &ParsedManuscript) {
    for dropped in &parsed.dropped {
        debug!(
            filename = %parsed.filename,
            offset = dropped.offset,
            raw = %dropped.raw,
            reason = dropped.error.kind(),
            error = %dropped.error,
            "dropped citation candidate"
        );
    }

    for preview in &parsed.previews {
        info!(
            filename = %parsed.filename,
            reference = %preview.reference,
            form = preview.form,
            clause = preview.clause,
            passage = %preview.passage,
            "match"
        );
    }
}

pub(super) fn warn_failed(path: &Path, error: &anyhow::Error) {
    let message = format!("{error:#}");
    warn!(path = %path.display(), error = %message, "failed to ingest manuscript");
}
