//! Error types for ofem-model

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("duplicate {kind} label '{label}'")]
    DuplicateEntity { kind: &'static str, label: String },

    #[error("{owner} references undefined {kind} '{label}'")]
    MissingReference {
        kind: &'static str,
        label: String,
        owner: String,
    },

    #[error("required table '{0}' is missing")]
    MissingTable(String),

    #[error("table '{table}', row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("unsupported element type code {code}")]
    UnsupportedElementType { code: i32 },

    #[error("model has no elements")]
    NoElements,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid defaults file: {0}")]
    Json(#[from] serde_json::Error),
}
