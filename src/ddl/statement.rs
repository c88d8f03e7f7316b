//! Individual DDL statements and how they render

use std::fmt;

use crate::catalog::{EnumTypeRecord, PolicyRecord, SequenceRecord};
use crate::normalize::{quote_ident, quote_literal};

/// One statement of a generated document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `-- text`, one line per line of text
    Comment(String),
    SetSearchPath(String),
    CreateExtension(String),
    /// `CREATE TYPE ... AS ENUM` that ignores an already existing type
    CreateEnum(EnumTypeRecord),
    CreateSequence(SequenceRecord),
    DropTable(String),
    CreateTable {
        name: String,
        /// Already-rendered column definitions
        columns: Vec<String>,
        primary_key: Vec<String>,
    },
    EnableRowLevelSecurity(String),
    /// A full function definition, emitted as-is
    CreateFunction(String),
    DropPolicy {
        table: String,
        name: String,
    },
    CreatePolicy(PolicyRecord),
}

impl Statement {
    /// Statements that open a new block and get a blank line before them
    pub fn starts_block(&self) -> bool {
        matches!(
            self,
            Statement::Comment(_) | Statement::CreateFunction(_) | Statement::DropPolicy { .. }
        )
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Comment(text) => {
                let mut lines = text.lines();
                if let Some(first) = lines.next() {
                    write!(f, "-- {}", first)?;
                }
                for line in lines {
                    write!(f, "\n-- {}", line)?;
                }
                Ok(())
            }
            Statement::SetSearchPath(schema) => {
                write!(f, "SET search_path TO {};", quote_ident(schema))
            }
            Statement::CreateExtension(name) => {
                write!(f, "CREATE EXTENSION IF NOT EXISTS {};", quote_ident(name))
            }
            Statement::CreateEnum(e) => {
                let labels: Vec<String> = e.labels.iter().map(|l| quote_literal(l)).collect();
                writeln!(f, "DO $$ BEGIN")?;
                writeln!(
                    f,
                    "    CREATE TYPE {} AS ENUM ({});",
                    quote_ident(&e.type_name),
                    labels.join(", ")
                )?;
                writeln!(f, "EXCEPTION")?;
                writeln!(f, "    WHEN duplicate_object THEN null;")?;
                write!(f, "END $$;")
            }
            Statement::CreateSequence(seq) => {
                write!(
                    f,
                    "CREATE SEQUENCE IF NOT EXISTS {} AS {} START WITH {} INCREMENT BY {} MINVALUE {} MAXVALUE {} {};",
                    quote_ident(&seq.name),
                    seq.data_type,
                    seq.start,
                    seq.increment,
                    seq.min,
                    seq.max,
                    if seq.cycle { "CYCLE" } else { "NO CYCLE" }
                )
            }
            Statement::DropTable(name) => {
                write!(f, "DROP TABLE IF EXISTS {} CASCADE;", quote_ident(name))
            }
            Statement::CreateTable {
                name,
                columns,
                primary_key,
            } => {
                let mut items: Vec<String> = columns.iter().map(|c| format!("    {}", c)).collect();
                if !primary_key.is_empty() {
                    let keys: Vec<_> = primary_key.iter().map(|k| quote_ident(k)).collect();
                    items.push(format!("    PRIMARY KEY ({})", keys.join(", ")));
                }
                write!(
                    f,
                    "CREATE TABLE {} (\n{}\n);",
                    quote_ident(name),
                    items.join(",\n")
                )
            }
            Statement::EnableRowLevelSecurity(name) => {
                write!(f, "ALTER TABLE {} ENABLE ROW LEVEL SECURITY;", quote_ident(name))
            }
            Statement::CreateFunction(definition) => {
                let body = definition.trim_end();
                if body.ends_with(';') {
                    f.write_str(body)
                } else {
                    write!(f, "{};", body)
                }
            }
            Statement::DropPolicy { table, name } => {
                write!(
                    f,
                    "DROP POLICY IF EXISTS {} ON {};",
                    quote_ident(name),
                    quote_ident(table)
                )
            }
            Statement::CreatePolicy(policy) => {
                let roles: Vec<_> = policy.roles.iter().map(|r| quote_ident(r)).collect();
                write!(
                    f,
                    "CREATE POLICY {} ON {}\n    AS {}\n    FOR {}\n    TO {}",
                    quote_ident(&policy.policy_name),
                    quote_ident(&policy.table_name),
                    policy.permissive,
                    policy.command,
                    roles.join(", ")
                )?;
                if let Some(using) = &policy.using_expression {
                    write!(f, "\n    USING ({})", using)?;
                }
                if let Some(check) = &policy.with_check_expression {
                    write!(f, "\n    WITH CHECK ({})", check)?;
                }
                f.write_str(";")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_enum_is_guarded() {
        let stmt = Statement::CreateEnum(EnumTypeRecord {
            type_name: "meal_type".to_string(),
            labels: vec!["breakfast".to_string(), "kid's snack".to_string()],
        });
        assert_eq!(
            stmt.to_string(),
            "DO $$ BEGIN\n    CREATE TYPE meal_type AS ENUM ('breakfast', 'kid''s snack');\nEXCEPTION\n    WHEN duplicate_object THEN null;\nEND $$;"
        );
    }

    #[test]
    fn test_create_sequence() {
        let stmt = Statement::CreateSequence(SequenceRecord {
            name: "meals_id_seq".to_string(),
            data_type: "bigint".to_string(),
            start: "1".to_string(),
            min: "1".to_string(),
            max: "9223372036854775807".to_string(),
            increment: "1".to_string(),
            cycle: false,
        });
        assert_eq!(
            stmt.to_string(),
            "CREATE SEQUENCE IF NOT EXISTS meals_id_seq AS bigint START WITH 1 INCREMENT BY 1 MINVALUE 1 MAXVALUE 9223372036854775807 NO CYCLE;"
        );
    }

    #[test]
    fn test_create_table_with_primary_key() {
        let stmt = Statement::CreateTable {
            name: "user".to_string(),
            columns: vec!["id uuid NOT NULL".to_string(), "name TEXT".to_string()],
            primary_key: vec!["id".to_string()],
        };
        assert_eq!(
            stmt.to_string(),
            "CREATE TABLE \"user\" (\n    id uuid NOT NULL,\n    name TEXT,\n    PRIMARY KEY (id)\n);"
        );
    }

    #[test]
    fn test_create_table_without_primary_key() {
        let stmt = Statement::CreateTable {
            name: "events".to_string(),
            columns: vec!["payload jsonb".to_string()],
            primary_key: vec![],
        };
        assert_eq!(stmt.to_string(), "CREATE TABLE events (\n    payload jsonb\n);");
    }

    #[test]
    fn test_create_function_terminated_once() {
        let stmt = Statement::CreateFunction("CREATE FUNCTION f() ... $function$\n".to_string());
        assert_eq!(stmt.to_string(), "CREATE FUNCTION f() ... $function$;");

        let stmt = Statement::CreateFunction("CREATE FUNCTION g() ...;".to_string());
        assert_eq!(stmt.to_string(), "CREATE FUNCTION g() ...;");
    }

    #[test]
    fn test_create_policy() {
        let stmt = Statement::CreatePolicy(PolicyRecord {
            table_name: "meals".to_string(),
            policy_name: "Users can update own meals".to_string(),
            permissive: "PERMISSIVE".to_string(),
            command: "UPDATE".to_string(),
            roles: vec!["authenticated".to_string(), "service_role".to_string()],
            using_expression: Some("(auth.uid() = user_id)".to_string()),
            with_check_expression: Some("(auth.uid() = user_id)".to_string()),
        });
        assert_eq!(
            stmt.to_string(),
            "CREATE POLICY \"Users can update own meals\" ON meals\n    AS PERMISSIVE\n    FOR UPDATE\n    TO authenticated, service_role\n    USING ((auth.uid() = user_id))\n    WITH CHECK ((auth.uid() = user_id));"
        );
    }

    #[test]
    fn test_multiline_comment() {
        let stmt = Statement::Comment("first\nsecond".to_string());
        assert_eq!(stmt.to_string(), "-- first\n-- second");
    }
}
