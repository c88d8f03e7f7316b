use thiserror::Error;

use crate::catalog::ObjectKind;

/// ddlift errors
#[derive(Error, Debug)]
pub enum DdliftError {
    #[error("Failed to connect to database: {0}")]
    Connection(String),

    #[error("Failed to introspect schema '{schema}': {message}")]
    Introspection { schema: String, message: String },

    #[error("Failed to read {kind} '{name}': {message}")]
    ObjectQuery {
        kind: ObjectKind,
        name: String,
        message: String,
    },

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
