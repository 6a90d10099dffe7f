//! Error types for ofem-io

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    /// Not produced for models built by `from_tables` or `from_mesh`, which
    /// reject unknown codes themselves.
    #[error("element '{element}' has unsupported type code {code}")]
    UnsupportedElementType { element: String, code: i32 },

    /// Not produced for built models either; their sections and materials
    /// are resolved during construction.
    #[error("{owner} references undefined {kind} '{label}'")]
    MissingReference {
        kind: &'static str,
        label: String,
        owner: String,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("deck formatting failed")]
    Format(#[from] std::fmt::Error),
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("required file {0} is missing")]
    MissingMember(PathBuf),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("section physical groups require 'sections' or 'elements' grouping, got '{0}'")]
    InvalidGrouping(String),

    /// Raised by `import_discrete` for unknown cell codes. Built models never
    /// carry one.
    #[error("element '{element}' has unsupported type code {code}")]
    UnsupportedElementType { element: String, code: i32 },

    #[error("geometry kernel: {0}")]
    Kernel(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum MeshReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: no element type for solver type {solver_type} with {node_count} nodes")]
    UnsupportedElementType {
        line: usize,
        solver_type: u32,
        node_count: usize,
    },
}

#[derive(Error, Debug)]
pub enum ResultReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}
