use chrono::Utc;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::*;
use crate::cli::IngestArgs;
use crate::commands::{inventory, status};
use crate::model::{FileOutcome, FileStatus, IngestCounts, IngestPaths, IngestRunSummary};
use crate::resolver;
use crate::store::DB_SCHEMA_VERSION;
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let manuscripts_dir = args.manuscripts_dir();
    let db_path = args.db_path();
    let summary_path = args.summary_path.clone().unwrap_or_else(|| {
        args.data_root.join("manifests").join(format!(
            "ingest_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(
        data_root = %args.data_root.display(),
        run_id = %run_id,
        dry_run = args.dry_run,
        "starting ingest"
    );

    // Configuration problems abort here, before any manuscript is parsed.
    let catalog = match &args.catalog_path {
        Some(path) => {
            let catalog = ManuscriptCatalog::load(path)?;
            info!(path = %path.display(), entries = catalog.len(), "loaded manuscript catalog");
            catalog
        }
        None => ManuscriptCatalog::new(HashMap::new())?,
    };

    let mut warnings = Vec::new();
    let paths = if args.files.is_empty() {
        let discovered = inventory::discover_manuscripts(&manuscripts_dir, args.min_bytes)?;
        warnings.extend(
            discovered
                .skipped_small
                .iter()
                .map(|filename| format!("skipped {filename}: not larger than {} bytes", args.min_bytes)),
        );
        discovered
            .manuscripts
            .into_iter()
            .map(|(path, _)| path)
            .collect()
    } else {
        args.files.clone()
    };

    let mut store = if args.dry_run {
        None
    } else {
        if let Some(parent) = db_path.parent() {
            ensure_directory(parent)?;
        }
        Some(ReferenceStore::open(&db_path)?)
    };
    let fingerprints = match &store {
        Some(store) if !args.force => store.ingest_fingerprints()?,
        _ => HashMap::new(),
    };

    let pool = ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .context("failed to build parser thread pool")?;
    let parser = ManuscriptParser::new(resolver::shared(), &catalog, args.verbose || args.dry_run)?;

    info!(
        manuscripts = paths.len(),
        threads = pool.current_num_threads(),
        aliases = resolver::shared().alias_count(),
        rules_version = RULES_VERSION,
        "parsing manuscripts"
    );

    let report = ingest_paths(&pool, &parser, &paths, &fingerprints, store.as_mut());
    warnings.extend(report.warnings);

    let counts = report.counts;
    info!(
        files_processed = counts.files_processed,
        files_skipped_unchanged = counts.files_skipped_unchanged,
        files_failed = counts.files_failed,
        occurrences_stored = counts.occurrences_stored,
        occurrences_dropped = counts.occurrences_dropped,
        "ingest completed"
    );

    let Some(store) = store else {
        info!("dry-run: database and run summary left untouched");
        return Ok(());
    };

    let summary = IngestRunSummary {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        rules_version: RULES_VERSION.to_string(),
        status: if counts.files_failed == 0 {
            "completed".to_string()
        } else {
            "completed_with_failures".to_string()
        },
        dry_run: false,
        started_at,
        updated_at: now_utc_string(),
        paths: IngestPaths {
            data_root: args.data_root.display().to_string(),
            manuscripts_dir: manuscripts_dir.display().to_string(),
            db_path: db_path.display().to_string(),
            catalog_path: args.catalog_path.as_ref().map(|path| path.display().to_string()),
            summary_path: Some(summary_path.display().to_string()),
        },
        counts,
        files: report.files,
        warnings,
    };
    write_json_pretty(&summary_path, &summary)?;
    info!(path = %summary_path.display(), "wrote ingest run summary");

    if args.stats {
        status::log_store_status(&store, status::DEFAULT_TOP_CHAPTERS)?;
    }

    Ok(())
}

#[derive(Debug, Default)]
pub(super) struct IngestReport {
    pub(super) counts: IngestCounts,
    pub(super) files: Vec<FileOutcome>,
    pub(super) warnings: Vec<String>,
}

/// Parses `paths` on the pool, then stores each manuscript in its own
/// transaction on the calling thread. Without a store nothing is written.
/// A manuscript that fails is recorded and the batch continues.
pub(super) fn ingest_paths(
    pool: &ThreadPool,
    parser: &ManuscriptParser<'_>,
    paths: &[PathBuf],
    fingerprints: &HashMap<String, IngestFingerprint>,
    mut store: Option<&mut ReferenceStore>,
) -> IngestReport {
    let results: Vec<Result<ParseOutcome>> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| parser.parse_file(path, fingerprints))
            .collect()
    });

    let mut report = IngestReport {
        counts: IngestCounts {
            files_discovered: paths.len(),
            ..IngestCounts::default()
        },
        ..IngestReport::default()
    };

    for (path, result) in paths.iter().zip(results) {
        let parsed = match result {
            Ok(ParseOutcome::Parsed(parsed)) => parsed,
            Ok(ParseOutcome::Unchanged { filename }) => {
                debug!(filename = %filename, "manuscript unchanged, skipping");
                report.counts.files_skipped_unchanged += 1;
                report.files.push(FileOutcome {
                    filename,
                    status: FileStatus::SkippedUnchanged,
                    occurrences: 0,
                    dropped: 0,
                    error: None,
                });
                continue;
            }
            Err(err) => {
                report.record_failure(path, display_filename(path), &err);
                continue;
            }
        };

        log_parsed(&parsed);
        report.counts.occurrences_dropped += parsed.dropped.len();
        for dropped in &parsed.dropped {
            *report
                .counts
                .dropped_by_reason
                .entry(dropped.error.kind().to_string())
                .or_default() += 1;
        }

        let status = match store.as_deref_mut() {
            None => FileStatus::DryRun,
            Some(store) => match store_manuscript(store, &parsed) {
                Ok(stored) => {
                    report.counts.occurrences_stored += stored;
                    FileStatus::Stored
                }
                Err(err) => {
                    report.record_failure(path, parsed.filename, &err);
                    continue;
                }
            },
        };

        info!(
            filename = %parsed.filename,
            author = %parsed.metadata.author,
            occurrences = parsed.occurrences.len(),
            dropped = parsed.dropped.len(),
            "parsed manuscript"
        );
        report.counts.files_processed += 1;
        report.files.push(FileOutcome {
            filename: parsed.filename,
            status,
            occurrences: parsed.occurrences.len(),
            dropped: parsed.dropped.len(),
            error: None,
        });
    }

    report
}

impl IngestReport {
    fn record_failure(&mut self, path: &Path, filename: String, error: &anyhow::Error) {
        warn_failed(path, error);
        self.counts.files_failed += 1;
        self.warnings.push(format!("{filename}: {error:#}"));
        self.files.push(FileOutcome {
            filename,
            status: FileStatus::Failed,
            occurrences: 0,
            dropped: 0,
            error: Some(format!("{error:#}")),
        });
    }
}
