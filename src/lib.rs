//! # ddlift
//!
//! Regenerate a PostgreSQL schema as re-runnable SQL scripts
//!
//! This crate provides a CLI tool and library for reading a database's
//! catalogs and writing the DDL needed to recreate its extensions, types,
//! sequences, tables, functions and row-level security policies.

pub mod catalog;
pub mod config;
pub mod ddl;
pub mod emit;
pub mod error;
pub mod extract;
pub mod introspect;
pub mod logging;
pub mod normalize;

pub mod prelude {
    pub use crate::catalog::{
        Catalog, ColumnRecord, EnumTypeRecord, ExtensionRecord, FunctionRecord, PolicyRecord,
        SequenceRecord, Skipped, TableRecord,
    };
    pub use crate::config::RunConfig;
    pub use crate::ddl::{synthesize, Document, Documents, Statement};
    pub use crate::error::DdliftError;
    pub use crate::extract::{run_extraction, RunSummary};
    pub use crate::introspect::{read_catalog, CatalogSource, TableFilter};
}

#[cfg(feature = "postgres")]
pub use introspect::PostgresCatalog;
