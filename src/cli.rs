use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "versecite",
    version,
    about = "Scripture citation indexing for historical theological manuscripts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List manuscripts with their sizes and content hashes.
    Inventory(InventoryArgs),
    /// Scan manuscripts for citations and store them.
    Ingest(IngestArgs),
    /// Show database totals and the most cited chapters.
    Status(StatusArgs),
    /// Render every stored passage citing one chapter.
    Show(ShowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".cache/versecite")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub manuscripts_dir: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = 1000)]
    pub min_bytes: u64,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Manuscripts to ingest; every `*.txt` in the manuscripts directory when empty.
    pub files: Vec<PathBuf>,

    #[arg(long, default_value = ".cache/versecite")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub manuscripts_dir: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub catalog_path: Option<PathBuf>,

    #[arg(long)]
    pub summary_path: Option<PathBuf>,

    /// Parser threads; defaults to the available parallelism.
    #[arg(long)]
    pub jobs: Option<usize>,

    #[arg(long, default_value_t = 1000)]
    pub min_bytes: u64,

    /// Re-ingest manuscripts whose text and rules are unchanged.
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Log matches without writing to the database.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,

    /// Log database totals and the most cited chapters afterwards.
    #[arg(long, default_value_t = false)]
    pub stats: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/versecite")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = 20)]
    pub top: usize,

    /// Also report the stored fingerprint and citations of one manuscript.
    #[arg(long)]
    pub manuscript: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[arg(long, default_value = ".cache/versecite")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub manuscripts_dir: Option<PathBuf>,

    /// Book slug, for example `romans` or `1-corinthians`.
    #[arg(long)]
    pub book: String,

    #[arg(long)]
    pub chapter: u32,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl InventoryArgs {
    pub fn manuscripts_dir(&self) -> PathBuf {
        manuscripts_dir(&self.data_root, self.manuscripts_dir.as_ref())
    }
}

impl IngestArgs {
    pub fn manuscripts_dir(&self) -> PathBuf {
        manuscripts_dir(&self.data_root, self.manuscripts_dir.as_ref())
    }

    pub fn db_path(&self) -> PathBuf {
        db_path(&self.data_root, self.db_path.as_ref())
    }
}

impl StatusArgs {
    pub fn db_path(&self) -> PathBuf {
        db_path(&self.data_root, self.db_path.as_ref())
    }
}

impl ShowArgs {
    pub fn manuscripts_dir(&self) -> PathBuf {
        manuscripts_dir(&self.data_root, self.manuscripts_dir.as_ref())
    }

    pub fn db_path(&self) -> PathBuf {
        db_path(&self.data_root, self.db_path.as_ref())
    }
}

fn manuscripts_dir(data_root: &Path, explicit: Option<&PathBuf>) -> PathBuf {
    explicit
        .cloned()
        .unwrap_or_else(|| data_root.join("manuscripts"))
}

fn db_path(data_root: &Path, explicit: Option<&PathBuf>) -> PathBuf {
    explicit
        .cloned()
        .unwrap_or_else(|| data_root.join("versecite.sqlite"))
}
