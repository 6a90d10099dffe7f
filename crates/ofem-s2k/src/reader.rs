//! Single-pass S2K document reader.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, S2kError};
use crate::line::{LineKind, classify_line};
use crate::table::TableSet;

/// Streams physical lines into a [`TableSet`].
///
/// A continued line is held back and merged with the following physical
/// line before classification. A data row is appended to the most recently
/// opened table.
#[derive(Debug, Default)]
pub struct S2kReader {
    tables: TableSet,
    current: Option<String>,
    pending: Option<String>,
    line: usize,
}

impl S2kReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_str(raw: &str) -> Result<TableSet> {
        let mut reader = Self::new();
        for line in raw.lines() {
            reader.feed_line(line)?;
        }
        Ok(reader.finish())
    }

    pub fn read_file(path: impl AsRef<Path>) -> Result<TableSet> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| S2kError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = raw.len(), "reading S2K document");
        Self::parse_str(&raw)
    }

    /// Number of physical lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line
    }

    pub fn feed_line(&mut self, raw: &str) -> Result<()> {
        self.line += 1;
        let pending = self.pending.take();
        match classify_line(raw, pending.as_deref()) {
            LineKind::Empty => {
                // A non-blank pending prefix never classifies as empty; it is
                // flushed as a row instead.
                if pending.is_some() {
                    warn!(line = self.line, "blank continued line dropped");
                }
            }
            LineKind::Continuation { prefix } => self.pending = Some(prefix),
            LineKind::TableHeader { title } => {
                self.tables.open(&title);
                self.current = Some(title);
            }
            LineKind::DataRow { values } => {
                let title = self
                    .current
                    .as_deref()
                    .ok_or(S2kError::MalformedTable { line: self.line })?;
                self.tables.open(title).push_row(values);
            }
        }
        Ok(())
    }

    pub fn finish(self) -> TableSet {
        if self.pending.is_some() {
            warn!(line = self.line, "document ends inside a continued line");
        }
        debug!(tables = self.tables.len(), lines = self.line, "S2K document read");
        self.tables
    }
}
