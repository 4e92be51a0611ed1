use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::cli::InventoryArgs;
use crate::model::{ManuscriptEntry, ManuscriptInventory};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manuscripts_dir = args.manuscripts_dir();
    let manifest = build_manifest(&manuscripts_dir, args.min_bytes)?;

    if args.dry_run {
        info!(
            manuscript_count = manifest.manuscript_count,
            skipped_small = manifest.skipped_small.len(),
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args.manifest_path.unwrap_or_else(|| {
        args.data_root
            .join("manifests")
            .join("manuscript_inventory.json")
    });

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(manuscript_count = manifest.manuscript_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(manuscripts_dir: &Path, min_bytes: u64) -> Result<ManuscriptInventory> {
    let discovered = discover_manuscripts(manuscripts_dir, min_bytes)?;

    let mut manuscripts = Vec::with_capacity(discovered.manuscripts.len());
    for (path, bytes) in discovered.manuscripts {
        manuscripts.push(ManuscriptEntry {
            filename: manuscript_filename(&path)?,
            bytes,
            sha256: sha256_file(&path)?,
        });
    }

    Ok(ManuscriptInventory {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: manuscripts_dir.display().to_string(),
        min_bytes,
        manuscript_count: manuscripts.len(),
        manuscripts,
        skipped_small: discovered.skipped_small,
    })
}

#[derive(Debug, Default)]
pub struct DiscoveredManuscripts {
    /// Paths sorted by filename, with their size in bytes.
    pub manuscripts: Vec<(PathBuf, u64)>,
    pub skipped_small: Vec<String>,
}

/// Lists the `*.txt` files of a directory. Files of at most `min_bytes`
/// are test stubs and are reported separately.
pub fn discover_manuscripts(manuscripts_dir: &Path, min_bytes: u64) -> Result<DiscoveredManuscripts> {
    let entries = fs::read_dir(manuscripts_dir)
        .with_context(|| format!("failed to read {}", manuscripts_dir.display()))?;

    let mut discovered = DiscoveredManuscripts::default();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", manuscripts_dir.display()))?;
        let path = entry.path();

        let metadata = entry
            .metadata()
            .with_context(|| format!("failed to inspect file: {}", path.display()))?;
        if !metadata.is_file() {
            continue;
        }

        let is_text = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
        if !is_text {
            continue;
        }

        if metadata.len() <= min_bytes {
            debug!(path = %path.display(), bytes = metadata.len(), "skipping small manuscript");
            discovered.skipped_small.push(manuscript_filename(&path)?);
            continue;
        }

        discovered.manuscripts.push((path, metadata.len()));
    }

    discovered.manuscripts.sort();
    discovered.skipped_small.sort();

    if discovered.manuscripts.is_empty() {
        bail!("no manuscripts found in {}", manuscripts_dir.display());
    }

    Ok(discovered)
}

pub fn manuscript_filename(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))
}
