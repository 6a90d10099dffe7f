//! Reader for S2K tabular text exports.
//!
//! An S2K document is a sequence of `TABLE:  "NAME"` headers, each followed by
//! data lines of `key=value` pairs. Long lines are continued with a trailing
//! underscore. This crate provides:
//! - [`classify_line`]: classification of one physical line
//! - [`S2kReader`]: single-pass assembly of lines into a [`TableSet`]
//! - [`Table`]/[`TableSet`]: column-oriented, case-insensitively keyed tables

mod error;
pub mod line;
mod reader;
pub mod table;

pub use error::{Result, S2kError};
pub use line::{LineKind, RowValues, classify_line, tokenize};
pub use reader::S2kReader;
pub use table::{Column, Row, Table, TableSet};
