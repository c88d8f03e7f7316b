//! Catalog records
//!
//! These types hold what one run reads from the database catalogs and form the
//! contract between introspection (produces) and DDL synthesis (consumes).
//! Nothing here outlives a single run.

use std::fmt;

/// An installed extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRecord {
    pub name: String,
}

/// A custom enum type, labels in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumTypeRecord {
    pub type_name: String,
    pub labels: Vec<String>,
}

/// A sequence as reported by `information_schema.sequences`
///
/// Numeric parameters are kept as the catalog's text so they are emitted
/// exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub name: String,
    pub data_type: String,
    pub start: String,
    pub min: String,
    pub max: String,
    pub increment: String,
    pub cycle: bool,
}

/// Identity generation mode of a column declared `GENERATED ... AS IDENTITY`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    Always,
    ByDefault,
}

/// A table column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRecord {
    pub name: String,
    /// `information_schema.columns.data_type`, e.g. `character varying`, `ARRAY`
    pub raw_sql_type: String,
    /// Underlying type name, e.g. `int4`, `_text`, `mood`
    pub udt_name: Option<String>,
    pub is_nullable: bool,
    pub max_length: Option<i32>,
    pub default_expression: Option<String>,
    pub ordinal_position: i32,
    pub identity: Option<IdentityKind>,
    /// Expression of a stored generated column
    pub generation_expression: Option<String>,
}

/// A base table with its columns and primary key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRecord {
    pub name: String,
    pub columns: Vec<ColumnRecord>,
    /// Column names that form the primary key (in order)
    pub primary_key_columns: Vec<String>,
}

impl TableRecord {
    /// Build a table record from the results of two separate catalog queries.
    ///
    /// Columns are ordered by ordinal position. Primary key names are
    /// deduplicated and restricted to columns that are actually present, since
    /// the column and key queries may observe different catalog states.
    pub fn new(
        name: impl Into<String>,
        mut columns: Vec<ColumnRecord>,
        primary_key_columns: Vec<String>,
    ) -> Self {
        columns.sort_by_key(|col| col.ordinal_position);

        let mut primary_key: Vec<String> = Vec::with_capacity(primary_key_columns.len());
        for pk_name in primary_key_columns {
            if primary_key.contains(&pk_name) {
                continue;
            }
            if columns.iter().any(|col| col.name == pk_name) {
                primary_key.push(pk_name);
            }
        }

        Self {
            name: name.into(),
            columns,
            primary_key_columns: primary_key,
        }
    }
}

/// A stored function and its full `CREATE OR REPLACE FUNCTION` text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    pub name: String,
    pub full_definition_text: String,
}

/// Languages whose functions are tied to the server binary
const NATIVE_LANGUAGES: &[&str] = &["c", "internal"];

/// Handle on a function whose definition has not been fetched yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    pub oid: u32,
    pub name: String,
    /// `pg_language.lanname`
    pub language: String,
    /// Member of an installed extension
    pub extension_owned: bool,
}

impl FunctionRef {
    /// Whether the function belongs in the generated functions script
    ///
    /// Extension members come back with `CREATE EXTENSION`, and C/internal
    /// functions cannot be recreated from their definition text.
    pub fn should_emit(&self) -> bool {
        !self.extension_owned && !NATIVE_LANGUAGES.contains(&self.language.as_str())
    }
}

/// A row-level security policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRecord {
    pub table_name: String,
    pub policy_name: String,
    /// `PERMISSIVE` or `RESTRICTIVE`
    pub permissive: String,
    /// `ALL`, `SELECT`, `INSERT`, `UPDATE` or `DELETE`
    pub command: String,
    /// Always a concrete, non-empty list
    pub roles: Vec<String>,
    pub using_expression: Option<String>,
    pub with_check_expression: Option<String>,
}

/// Kind of catalog object, used when reporting per-object failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    Function,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Table => f.write_str("table"),
            ObjectKind::Function => f.write_str("function"),
        }
    }
}

/// An object left out of the output, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub kind: ObjectKind,
    pub name: String,
    pub reason: String,
}

/// Everything read from the catalogs in one run
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub schema: String,
    pub extensions: Vec<ExtensionRecord>,
    pub enums: Vec<EnumTypeRecord>,
    pub sequences: Vec<SequenceRecord>,
    /// Every listed base table, including ones that were later skipped
    pub table_names: Vec<String>,
    pub tables: Vec<TableRecord>,
    pub functions: Vec<FunctionRecord>,
    pub policies: Vec<PolicyRecord>,
    pub skipped: Vec<Skipped>,
}
