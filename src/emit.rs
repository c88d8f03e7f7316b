//! Output files
//!
//! Writes the generated documents to their fixed file names, replacing any
//! previous run's output. Files are written in order; if one fails the ones
//! already written are left in place.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::ddl::{Document, Documents};
use crate::prelude::DdliftError;

/// Write one document under `output_dir`
pub fn write_document(document: &Document, output_dir: &Path) -> Result<PathBuf, DdliftError> {
    let path = output_dir.join(document.file_name);
    let sql = document.render();

    fs::write(&path, &sql).map_err(|e| {
        error!(path = ?path, error = ?e, "Failed to write output file");
        e
    })?;

    info!(path = ?path, bytes = sql.len(), "Wrote output file");
    Ok(path)
}

/// Write all documents, creating the output directory if needed
pub fn write_documents(
    documents: &Documents,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, DdliftError> {
    fs::create_dir_all(output_dir)?;
    debug!(path = ?output_dir, "Output directory ready");

    documents
        .iter()
        .map(|document| write_document(document, output_dir))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::catalog::Catalog;
    use crate::ddl::{synthesize, FUNCTIONS_FILE, POLICIES_FILE, SETUP_FILE, TABLES_FILE};

    fn empty_documents() -> Documents {
        let catalog = Catalog {
            schema: "public".to_string(),
            ..Catalog::default()
        };
        synthesize(&catalog, Utc::now())
    }

    #[test]
    fn test_writes_four_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("schema");

        let paths = write_documents(&empty_documents(), &out).unwrap();

        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec![SETUP_FILE, TABLES_FILE, FUNCTIONS_FILE, POLICIES_FILE]);
        for path in &paths {
            assert!(path.exists());
        }
    }

    #[test]
    fn test_overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join(TABLES_FILE);
        fs::write(&stale, "stale contents from an earlier run").unwrap();

        let documents = empty_documents();
        write_documents(&documents, dir.path()).unwrap();

        assert_eq!(fs::read_to_string(&stale).unwrap(), documents.tables.render());
    }

    #[test]
    fn test_unwritable_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "").unwrap();

        let result = write_documents(&empty_documents(), &blocker);
        assert!(matches!(result, Err(DdliftError::Output(_))));
    }
}
