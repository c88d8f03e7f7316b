//! Type and default normalization
//!
//! Turns catalog-native type names, default expressions and role lists into
//! portable DDL fragments. Nothing in here fails: anything unrecognized is
//! passed through unchanged.

use std::borrow::Cow;

use crate::catalog::{ColumnRecord, IdentityKind};

/// Role marker used when a policy applies to everyone
pub const PUBLIC_ROLE: &str = "public";

const IDENTITY_BY_DEFAULT: &str = "GENERATED BY DEFAULT AS IDENTITY";
const IDENTITY_ALWAYS: &str = "GENERATED ALWAYS AS IDENTITY";

/// Keywords that cannot be used as bare column or table names
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
    "column", "concurrently", "constraint", "create", "cross", "current_catalog",
    "current_date", "current_role", "current_schema", "current_time", "current_timestamp",
    "current_user", "default", "deferrable", "desc", "distinct", "do", "else", "end",
    "except", "false", "fetch", "for", "foreign", "freeze", "from", "full", "grant",
    "group", "having", "ilike", "in", "initially", "inner", "intersect", "into", "is",
    "isnull", "join", "lateral", "leading", "left", "like", "limit", "localtime",
    "localtimestamp", "natural", "not", "notnull", "null", "offset", "on", "only", "or",
    "order", "outer", "overlaps", "placing", "primary", "references", "returning", "right",
    "select", "session_user", "similar", "some", "symmetric", "system_user", "table",
    "tablesample", "then", "to", "trailing", "true", "union", "unique", "user", "using",
    "variadic", "verbose", "when", "where", "window", "with",
];

/// Map a column's catalog type to the type written in `CREATE TABLE`
///
/// - `character varying` becomes `VARCHAR(n)`, or `TEXT` without a length
/// - `USER-DEFINED` becomes the underlying type name, quoted when needed
/// - `ARRAY` becomes the element type name (leading `_` stripped, quoted when
///   needed) plus `[]`,
///   or `TEXT[]` when the element type is unknown
/// - anything else is emitted as reported
pub fn column_type(column: &ColumnRecord) -> String {
    let udt_name = column
        .udt_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    match column.raw_sql_type.as_str() {
        "character varying" => match column.max_length {
            Some(len) => format!("VARCHAR({})", len),
            None => "TEXT".to_string(),
        },
        "USER-DEFINED" => match udt_name {
            Some(name) => quote_ident(name).into_owned(),
            None => column.raw_sql_type.clone(),
        },
        "ARRAY" => match udt_name {
            Some(name) => {
                let element = name.strip_prefix('_').unwrap_or(name);
                format!("{}[]", quote_ident(element))
            }
            None => "TEXT[]".to_string(),
        },
        other => other.to_string(),
    }
}

/// The generation clause of a column, if it has one
///
/// Sequence-backed defaults (`nextval(...)`) become identity columns and take
/// priority over emitting the default itself.
pub fn column_default(column: &ColumnRecord) -> Option<String> {
    if let Some(kind) = column.identity {
        return Some(
            match kind {
                IdentityKind::Always => IDENTITY_ALWAYS,
                IdentityKind::ByDefault => IDENTITY_BY_DEFAULT,
            }
            .to_string(),
        );
    }

    if let Some(expr) = &column.generation_expression {
        return Some(format!("GENERATED ALWAYS AS ({}) STORED", expr));
    }

    let expr = column.default_expression.as_deref()?;
    if is_sequence_default(expr) {
        return Some(IDENTITY_BY_DEFAULT.to_string());
    }

    Some(format!("DEFAULT {}", rewrite_uuid_default(expr)))
}

/// Full column definition: name, type, generation clause and nullability
pub fn column_definition(column: &ColumnRecord) -> String {
    let mut def = format!("{} {}", quote_ident(&column.name), column_type(column));

    if let Some(default) = column_default(column) {
        def.push(' ');
        def.push_str(&default);
    }

    if !column.is_nullable {
        def.push_str(" NOT NULL");
    }

    def
}

/// Check if a default expression advances a sequence
pub fn is_sequence_default(expr: &str) -> bool {
    expr.to_lowercase().contains("nextval(")
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' || ch == '"'
}

/// Replace the `uuid-ossp` generator with the built-in one
///
/// Any schema qualifier on the old call is dropped, since `gen_random_uuid`
/// lives in `pg_catalog`.
pub fn rewrite_uuid_default(expr: &str) -> Cow<'_, str> {
    const LEGACY_CALL: &str = "uuid_generate_v4(";

    if !expr.contains(LEGACY_CALL) {
        return Cow::Borrowed(expr);
    }

    let mut out = String::with_capacity(expr.len());
    let mut rest = expr;
    while let Some(pos) = rest.find(LEGACY_CALL) {
        let prefix = &rest[..pos];
        if prefix.ends_with(is_ident_char) {
            // Some other function whose name merely ends the same way
            out.push_str(prefix);
            out.push_str(LEGACY_CALL);
        } else {
            let kept = match prefix.strip_suffix('.') {
                Some(qualifier) => qualifier.trim_end_matches(is_ident_char),
                None => prefix,
            };
            out.push_str(kept);
            out.push_str("gen_random_uuid(");
        }
        rest = &rest[pos + LEGACY_CALL.len()..];
    }
    out.push_str(rest);

    Cow::Owned(out)
}

/// Roles as the catalog handed them over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRoles {
    List(Vec<String>),
    /// Array text form, e.g. `{authenticated,"my role"}`
    Braced(String),
    Missing,
}

/// Turn whatever the catalog returned for a policy's roles into a list
///
/// An empty or unparseable value means the policy applies to `public`.
pub fn normalize_roles(raw: RawRoles) -> Vec<String> {
    let roles: Vec<String> = match raw {
        RawRoles::List(roles) => roles
            .into_iter()
            .map(|role| role.trim().to_string())
            .filter(|role| !role.is_empty())
            .collect(),
        RawRoles::Braced(text) => parse_braced_list(&text),
        RawRoles::Missing => Vec::new(),
    };

    if roles.is_empty() {
        vec![PUBLIC_ROLE.to_string()]
    } else {
        roles
    }
}

/// Parse the text form of a one-dimensional Postgres array
fn parse_braced_list(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(trimmed);

    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = inner.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ',' if !in_quotes => items.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    items.push(current);

    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Pin `search_path` on PL/pgSQL functions that don't set it themselves
///
/// Expects `pg_get_functiondef` output, where the header (everything before
/// the `AS` body line) carries one attribute per line.
pub fn pin_search_path<'a>(definition: &'a str, schema: &str) -> Cow<'a, str> {
    let header_end = definition.find("\nAS ").unwrap_or(definition.len());
    let header = definition[..header_end].to_ascii_lowercase();

    if header.contains("set search_path") {
        return Cow::Borrowed(definition);
    }

    const NEEDLE: &str = "language plpgsql";
    let Some(start) = header.match_indices(NEEDLE).map(|(i, _)| i).find(|i| {
        header[i + NEEDLE.len()..]
            .chars()
            .next()
            .map_or(true, |ch| ch.is_whitespace() || ch == ';')
    }) else {
        return Cow::Borrowed(definition);
    };

    let insert_at = start + NEEDLE.len();
    let mut pinned = String::with_capacity(definition.len() + 32);
    pinned.push_str(&definition[..insert_at]);
    pinned.push_str("\n SET search_path TO ");
    pinned.push_str(&quote_literal(schema));
    pinned.push_str(&definition[insert_at..]);
    Cow::Owned(pinned)
}

/// Quote an identifier the way `quote_ident` does: only when needed
pub fn quote_ident(name: &str) -> Cow<'_, str> {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first == '_' => chars
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '$'),
        _ => false,
    };

    if plain && !RESERVED_WORDS.contains(&name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("\"{}\"", name.replace('"', "\"\"")))
    }
}

/// Quote a string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
