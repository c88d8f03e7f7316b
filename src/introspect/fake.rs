//! In-memory catalog for tests

use super::CatalogSource;
use crate::catalog::{
    ColumnRecord, EnumTypeRecord, ExtensionRecord, FunctionRef, ObjectKind, PolicyRecord,
    SequenceRecord,
};
use crate::prelude::DdliftError;

#[derive(Debug, Default)]
pub(crate) struct FakeCatalog {
    pub extensions: Vec<ExtensionRecord>,
    pub enums: Vec<EnumTypeRecord>,
    pub sequences: Vec<SequenceRecord>,
    pub tables: Vec<(String, Vec<ColumnRecord>, Vec<String>)>,
    pub functions: Vec<(FunctionRef, String)>,
    pub policies: Vec<PolicyRecord>,
    pub failing_tables: Vec<String>,
    pub failing_functions: Vec<String>,
    pub fail_listing: bool,
}

pub(crate) fn int_column(name: &str, position: i32) -> ColumnRecord {
    ColumnRecord {
        name: name.to_string(),
        raw_sql_type: "integer".to_string(),
        udt_name: Some("int4".to_string()),
        is_nullable: false,
        max_length: None,
        default_expression: None,
        ordinal_position: position,
        identity: None,
        generation_expression: None,
    }
}

impl FakeCatalog {
    /// Tables with a single `id` primary key column each
    pub fn with_tables(names: &[&str]) -> Self {
        Self {
            tables: names
                .iter()
                .map(|name| {
                    (
                        name.to_string(),
                        vec![int_column("id", 1)],
                        vec!["id".to_string()],
                    )
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn fail_columns_for(&mut self, table: &str) {
        self.failing_tables.push(table.to_string());
    }

    pub fn fail_function(&mut self, name: &str) {
        self.failing_functions.push(name.to_string());
    }

    pub fn add_function(&mut self, name: &str, definition: &str) {
        self.push_function(name, "plpgsql", false, definition);
    }

    pub fn add_function_in(&mut self, name: &str, language: &str, definition: &str) {
        self.push_function(name, language, false, definition);
    }

    pub fn add_extension_function(&mut self, name: &str, definition: &str) {
        self.push_function(name, "c", true, definition);
    }

    fn push_function(
        &mut self,
        name: &str,
        language: &str,
        extension_owned: bool,
        definition: &str,
    ) {
        let oid = 16_000 + self.functions.len() as u32;
        self.functions.push((
            FunctionRef {
                oid,
                name: name.to_string(),
                language: language.to_string(),
                extension_owned,
            },
            definition.to_string(),
        ));
    }

    pub fn add_policy(&mut self, table: &str, name: &str) {
        self.policies.push(PolicyRecord {
            table_name: table.to_string(),
            policy_name: name.to_string(),
            permissive: "PERMISSIVE".to_string(),
            command: "SELECT".to_string(),
            roles: vec!["authenticated".to_string()],
            using_expression: Some("(auth.uid() = user_id)".to_string()),
            with_check_expression: None,
        });
    }

    fn listing<T: Clone>(&self, items: &[T]) -> Result<Vec<T>, DdliftError> {
        if self.fail_listing {
            return Err(DdliftError::Introspection {
                schema: "public".to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(items.to_vec())
    }
}

impl CatalogSource for FakeCatalog {
    fn schema(&self) -> &str {
        "public"
    }

    fn list_extensions(&mut self) -> Result<Vec<ExtensionRecord>, DdliftError> {
        self.listing(&self.extensions)
    }

    fn list_enum_types(&mut self) -> Result<Vec<EnumTypeRecord>, DdliftError> {
        self.listing(&self.enums)
    }

    fn list_sequences(&mut self) -> Result<Vec<SequenceRecord>, DdliftError> {
        self.listing(&self.sequences)
    }

    fn list_base_tables(&mut self) -> Result<Vec<String>, DdliftError> {
        let names: Vec<String> = self.tables.iter().map(|(name, _, _)| name.clone()).collect();
        self.listing(&names)
    }

    fn list_columns(&mut self, table_name: &str) -> Result<Vec<ColumnRecord>, DdliftError> {
        if self.failing_tables.iter().any(|t| t == table_name) {
            return Err(DdliftError::ObjectQuery {
                kind: ObjectKind::Table,
                name: table_name.to_string(),
                message: "relation does not exist".to_string(),
            });
        }
        Ok(self
            .tables
            .iter()
            .find(|(name, _, _)| name == table_name)
            .map(|(_, columns, _)| columns.clone())
            .unwrap_or_default())
    }

    fn list_primary_key_columns(&mut self, table_name: &str) -> Result<Vec<String>, DdliftError> {
        Ok(self
            .tables
            .iter()
            .find(|(name, _, _)| name == table_name)
            .map(|(_, _, pk)| pk.clone())
            .unwrap_or_default())
    }

    fn list_functions(&mut self) -> Result<Vec<FunctionRef>, DdliftError> {
        let refs: Vec<FunctionRef> = self.functions.iter().map(|(f, _)| f.clone()).collect();
        self.listing(&refs)
    }

    fn function_definition(&mut self, function: &FunctionRef) -> Result<String, DdliftError> {
        if self.failing_functions.contains(&function.name) {
            return Err(DdliftError::ObjectQuery {
                kind: ObjectKind::Function,
                name: function.name.clone(),
                message: "cache lookup failed".to_string(),
            });
        }
        Ok(self
            .functions
            .iter()
            .find(|(f, _)| f.oid == function.oid)
            .map(|(_, def)| def.clone())
            .unwrap_or_default())
    }

    fn list_policies(&mut self) -> Result<Vec<PolicyRecord>, DdliftError> {
        self.listing(&self.policies)
    }
}
