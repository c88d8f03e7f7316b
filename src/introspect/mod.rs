//! Database introspection
//!
//! This module reads structural metadata out of the database catalogs. The
//! per-database query code lives behind the [`CatalogSource`] trait; each
//! supported database has its own feature-gated submodule.

use tracing::{debug, error, info, trace};

use crate::catalog::{
    Catalog, ColumnRecord, EnumTypeRecord, ExtensionRecord, FunctionRecord, FunctionRef,
    ObjectKind, PolicyRecord, SequenceRecord, Skipped, TableRecord,
};
use crate::prelude::DdliftError;

/// Filters to apply during introspection
#[derive(Debug, Default, Clone)]
pub struct TableFilter {
    /// Only include these tables (if Some)
    pub include: Option<Vec<String>>,
    /// Exclude these tables
    pub exclude: Option<Vec<String>>,
}

impl TableFilter {
    /// Check if a table should be included
    pub fn should_include(&self, table_name: &str) -> bool {
        // Check include list
        if let Some(include) = &self.include {
            if !include.iter().any(|t| t == table_name) {
                return false;
            }
        }

        // Check exclude list
        if let Some(exclude) = &self.exclude {
            if exclude.iter().any(|t| t == table_name) {
                return false;
            }
        }

        true
    }

    pub fn is_active(&self) -> bool {
        self.include.is_some() || self.exclude.is_some()
    }
}

/// Read-only access to a database's catalogs for one schema
///
/// Every call is a single round trip. Implementations never write to the
/// database.
pub trait CatalogSource {
    /// Schema being introspected
    fn schema(&self) -> &str;

    /// Installed extensions, except the built-in procedural language
    fn list_extensions(&mut self) -> Result<Vec<ExtensionRecord>, DdliftError>;

    /// Enum types with labels in declaration order
    fn list_enum_types(&mut self) -> Result<Vec<EnumTypeRecord>, DdliftError>;

    fn list_sequences(&mut self) -> Result<Vec<SequenceRecord>, DdliftError>;

    /// Base table names (no views)
    fn list_base_tables(&mut self) -> Result<Vec<String>, DdliftError>;

    /// Columns of one table, ordered by ordinal position
    fn list_columns(&mut self, table_name: &str) -> Result<Vec<ColumnRecord>, DdliftError>;

    /// Primary key column names of one table. May contain duplicates.
    fn list_primary_key_columns(&mut self, table_name: &str)
        -> Result<Vec<String>, DdliftError>;

    /// Every function and procedure in the schema, with its language and
    /// whether an extension owns it
    fn list_functions(&mut self) -> Result<Vec<FunctionRef>, DdliftError>;

    /// Full `CREATE OR REPLACE FUNCTION` text of one function
    fn function_definition(&mut self, function: &FunctionRef) -> Result<String, DdliftError>;

    /// Row-level security policies, roles already normalized to a list
    fn list_policies(&mut self) -> Result<Vec<PolicyRecord>, DdliftError>;
}

/// Read the whole catalog for the source's schema
///
/// Schema-wide listings are fatal when they fail. A failure while reading a
/// single table or function only skips that object; it is logged and recorded
/// in [`Catalog::skipped`].
pub fn read_catalog<S: CatalogSource + ?Sized>(
    source: &mut S,
    filter: &TableFilter,
) -> Result<Catalog, DdliftError> {
    let schema = source.schema().to_string();
    info!(schema = ?schema, "Starting catalog extraction");

    info!("Extracting extensions");
    let extensions = source.list_extensions()?;
    debug!(count = ?extensions.len(), "Found extensions");

    info!("Extracting enum types");
    let enums = source.list_enum_types()?;
    debug!(count = ?enums.len(), "Found enum types");

    info!("Extracting sequences");
    let sequences = source.list_sequences()?;
    debug!(count = ?sequences.len(), "Found sequences");

    info!("Extracting tables");
    let all_table_names = source.list_base_tables()?;
    debug!(count = ?all_table_names.len(), "Found all tables");

    let table_names: Vec<String> = all_table_names
        .into_iter()
        .filter(|name| filter.should_include(name))
        .collect();
    if filter.is_active() {
        debug!(count = ?table_names.len(), "Tables after filtering");
    }

    let mut skipped = Vec::new();
    let mut tables = Vec::with_capacity(table_names.len());
    for table_name in &table_names {
        match read_table(source, table_name) {
            Ok(table) => tables.push(table),
            Err(skip) => {
                error!(table = ?skip.name, reason = %skip.reason, "Skipping table");
                skipped.push(skip);
            }
        }
    }

    info!("Extracting functions");
    let mut functions = Vec::new();
    for function in source.list_functions()? {
        if !function.should_emit() {
            debug!(
                function = ?function.name,
                language = ?function.language,
                extension_owned = function.extension_owned,
                "Leaving out function"
            );
            continue;
        }
        match read_function(source, &function) {
            Ok(record) => functions.push(record),
            Err(skip) => {
                error!(function = ?skip.name, reason = %skip.reason, "Skipping function");
                skipped.push(skip);
            }
        }
    }
    debug!(count = ?functions.len(), "Found functions");

    info!("Extracting policies");
    let policies: Vec<PolicyRecord> = source
        .list_policies()?
        .into_iter()
        .filter(|policy| filter.should_include(&policy.table_name))
        .collect();
    debug!(count = ?policies.len(), "Found policies");

    info!(
        schema = ?schema,
        tables = ?tables.len(),
        functions = ?functions.len(),
        policies = ?policies.len(),
        skipped = ?skipped.len(),
        "Catalog extraction complete"
    );

    Ok(Catalog {
        schema,
        extensions,
        enums,
        sequences,
        table_names,
        tables,
        functions,
        policies,
        skipped,
    })
}

/// Read one table's columns and primary key
fn read_table<S: CatalogSource + ?Sized>(
    source: &mut S,
    table_name: &str,
) -> Result<TableRecord, Skipped> {
    debug!(table = ?table_name, "Introspecting table");

    let skip = |e: DdliftError| Skipped {
        kind: ObjectKind::Table,
        name: table_name.to_string(),
        reason: e.to_string(),
    };

    let columns = source.list_columns(table_name).map_err(skip)?;
    trace!(table = ?table_name, columns = ?columns.len(), "Found columns");

    let primary_key = source.list_primary_key_columns(table_name).map_err(skip)?;
    trace!(table = ?table_name, primary_key = ?primary_key, "Found primary key");

    Ok(TableRecord::new(table_name, columns, primary_key))
}

fn read_function<S: CatalogSource + ?Sized>(
    source: &mut S,
    function: &FunctionRef,
) -> Result<FunctionRecord, Skipped> {
    trace!(function = ?function.name, oid = ?function.oid, "Fetching function definition");

    let full_definition_text = source
        .function_definition(function)
        .map_err(|e| Skipped {
            kind: ObjectKind::Function,
            name: function.name.clone(),
            reason: e.to_string(),
        })?;

    Ok(FunctionRecord {
        name: function.name.clone(),
        full_definition_text,
    })
}

// Feature-gated database implementations
#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::{connect, PostgresCatalog};

#[cfg(test)]
pub(crate) mod fake;
