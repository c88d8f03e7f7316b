//! DDL synthesis
//!
//! Assembles catalog records into the four ordered, re-runnable SQL documents:
//! setup, tables, functions and row-level security policies. Each document is
//! a list of [`Statement`]s rendered in one pass at the end.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::catalog::Catalog;
use crate::normalize::{column_definition, pin_search_path};

mod statement;

pub use statement::Statement;

pub const SETUP_FILE: &str = "00_setup.sql";
pub const TABLES_FILE: &str = "01_tables.sql";
pub const FUNCTIONS_FILE: &str = "02_functions.sql";
pub const POLICIES_FILE: &str = "03_rls.sql";

/// One output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: &'static str,
    pub statements: Vec<Statement>,
}

impl Document {
    fn new(file_name: &'static str) -> Self {
        Self {
            file_name,
            statements: Vec::new(),
        }
    }

    fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Render to SQL text
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 && statement.starts_block() {
                out.push('\n');
            }
            out.push_str(&statement.to_string());
            out.push('\n');
        }
        out
    }
}

/// The four generated documents, in execution order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Documents {
    pub setup: Document,
    pub tables: Document,
    pub functions: Document,
    pub policies: Document,
}

impl Documents {
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        [&self.setup, &self.tables, &self.functions, &self.policies].into_iter()
    }
}

/// Build all four documents from a catalog
///
/// Output depends only on the catalog, apart from `generated_at` which appears
/// in the setup header.
pub fn synthesize(catalog: &Catalog, generated_at: DateTime<Utc>) -> Documents {
    Documents {
        setup: setup_document(catalog, generated_at),
        tables: tables_document(catalog),
        functions: functions_document(catalog),
        policies: policies_document(catalog),
    }
}

fn header(doc: &mut Document, title: &str, catalog: &Catalog) {
    doc.push(Statement::Comment(title.to_string()));
    doc.push(Statement::SetSearchPath(catalog.schema.clone()));
}

/// Extensions, enum types, sequences, and a drop for every table
pub fn setup_document(catalog: &Catalog, generated_at: DateTime<Utc>) -> Document {
    let mut doc = Document::new(SETUP_FILE);

    doc.push(Statement::Comment(format!(
        "Schema setup for '{}'\nGenerated at {}",
        catalog.schema,
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )));
    doc.push(Statement::SetSearchPath(catalog.schema.clone()));

    if !catalog.extensions.is_empty() {
        doc.push(Statement::Comment("Extensions".to_string()));
        for ext in &catalog.extensions {
            doc.push(Statement::CreateExtension(ext.name.clone()));
        }
    }

    if !catalog.enums.is_empty() {
        doc.push(Statement::Comment("Enum types".to_string()));
        for e in &catalog.enums {
            doc.push(Statement::CreateEnum(e.clone()));
        }
    }

    if !catalog.sequences.is_empty() {
        doc.push(Statement::Comment("Sequences".to_string()));
        for seq in &catalog.sequences {
            doc.push(Statement::CreateSequence(seq.clone()));
        }
    }

    // Lets the full set of documents be replayed over an existing schema
    if !catalog.table_names.is_empty() {
        doc.push(Statement::Comment("Drop existing tables".to_string()));
        for name in &catalog.table_names {
            doc.push(Statement::DropTable(name.clone()));
        }
    }

    debug!(statements = ?doc.statements.len(), "Synthesized setup document");
    doc
}

/// Drop and create each table, then enable row-level security on it
pub fn tables_document(catalog: &Catalog) -> Document {
    let mut doc = Document::new(TABLES_FILE);
    header(&mut doc, "Tables", catalog);

    for table in &catalog.tables {
        doc.push(Statement::Comment(format!("Table: {}", table.name)));
        doc.push(Statement::DropTable(table.name.clone()));
        doc.push(Statement::CreateTable {
            name: table.name.clone(),
            columns: table.columns.iter().map(column_definition).collect(),
            primary_key: table.primary_key_columns.clone(),
        });
        doc.push(Statement::EnableRowLevelSecurity(table.name.clone()));
    }

    debug!(tables = ?catalog.tables.len(), "Synthesized tables document");
    doc
}

/// Function definitions, with `search_path` pinned on PL/pgSQL functions
pub fn functions_document(catalog: &Catalog) -> Document {
    let mut doc = Document::new(FUNCTIONS_FILE);
    header(&mut doc, "Functions", catalog);

    for function in &catalog.functions {
        let definition = pin_search_path(&function.full_definition_text, &catalog.schema);
        doc.push(Statement::CreateFunction(definition.into_owned()));
    }

    debug!(functions = ?catalog.functions.len(), "Synthesized functions document");
    doc
}

/// Drop-then-create for every row-level security policy
pub fn policies_document(catalog: &Catalog) -> Document {
    let mut doc = Document::new(POLICIES_FILE);
    header(&mut doc, "Row level security policies", catalog);

    for policy in &catalog.policies {
        doc.push(Statement::DropPolicy {
            table: policy.table_name.clone(),
            name: policy.policy_name.clone(),
        });
        doc.push(Statement::CreatePolicy(policy.clone()));
    }

    debug!(policies = ?catalog.policies.len(), "Synthesized policies document");
    doc
}
