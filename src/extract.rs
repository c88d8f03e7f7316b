//! One extraction run: read the catalog, build the documents, write them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::catalog::Skipped;
use crate::ddl::synthesize;
use crate::emit::write_documents;
use crate::introspect::{read_catalog, CatalogSource, TableFilter};
use crate::prelude::DdliftError;

/// What a run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub files: Vec<PathBuf>,
    pub extensions: usize,
    pub enums: usize,
    pub sequences: usize,
    pub tables: usize,
    pub functions: usize,
    pub policies: usize,
    pub skipped: Vec<Skipped>,
}

/// Extract the schema behind `source` into `output_dir`
///
/// Per-object failures are reported in [`RunSummary::skipped`]; only
/// schema-wide query failures and write failures are errors. Each skipped
/// object is logged once, when it is read.
pub fn run_extraction<S: CatalogSource + ?Sized>(
    source: &mut S,
    filter: &TableFilter,
    output_dir: &Path,
    generated_at: DateTime<Utc>,
) -> Result<RunSummary, DdliftError> {
    let catalog = read_catalog(source, filter)?;

    info!("Generating SQL documents");
    let documents = synthesize(&catalog, generated_at);

    let files = write_documents(&documents, output_dir)?;

    let summary = RunSummary {
        files,
        extensions: catalog.extensions.len(),
        enums: catalog.enums.len(),
        sequences: catalog.sequences.len(),
        tables: catalog.tables.len(),
        functions: catalog.functions.len(),
        policies: catalog.policies.len(),
        skipped: catalog.skipped,
    };

    info!(
        extensions = summary.extensions,
        enums = summary.enums,
        sequences = summary.sequences,
        tables = summary.tables,
        functions = summary.functions,
        policies = summary.policies,
        skipped = summary.skipped.len(),
        "Extraction complete"
    );

    Ok(summary)
}
