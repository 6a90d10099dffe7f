//! Error types for ofem-s2k

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, S2kError>;

#[derive(Error, Debug)]
pub enum S2kError {
    #[error("line {line}: data row outside of any table")]
    MalformedTable { line: usize },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
