use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::catalog::{ManuscriptCatalog, ManuscriptMetadata};
use crate::model::{CitationOccurrence, ManuscriptRecord};
use crate::resolver::Resolver;
use crate::scanner::{Citation, CitationScanner, DroppedCitation};
use crate::store::{IngestFingerprint, ReferenceStore};
use crate::text::SourceText;
use crate::util::read_manuscript;
use crate::window::{PassageWindow, PassageWindower};

/// Version of the recognition rules. Stored with every manuscript so that a
/// rules change forces re-ingestion of unchanged text.
pub const RULES_VERSION: &str = "3";

/// Characters of passage text shown next to each match in verbose logs.
const PREVIEW_CHARS: usize = 80;

mod parse;
mod run;
#[cfg(test)]
mod tests;
mod write;

pub use run::run;

use parse::*;
use write::*;
