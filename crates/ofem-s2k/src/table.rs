//! Column-oriented S2K tables.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::line::{END_OF_DATA, RowValues};

/// One named column; `None` marks a cell the row did not set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<String>>,
}

/// A named table whose columns are the union of the keys seen across its rows,
/// in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    len: usize,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            len: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Column lookup; exact name first, then ASCII case-insensitive.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        self.column(column)
            .and_then(|c| c.values.get(row))
            .and_then(|v| v.as_deref())
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.len).then_some(Row { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.len).map(move |index| Row { table: self, index })
    }

    /// Append one row; unseen keys become new columns backfilled with `None`.
    pub fn push_row(&mut self, values: RowValues) {
        let row = self.len;
        for (key, value) in values {
            let idx = match self.columns.iter().position(|c| c.name == key) {
                Some(idx) => idx,
                None => {
                    self.columns.push(Column {
                        name: key,
                        values: vec![None; row],
                    });
                    self.columns.len() - 1
                }
            };
            self.columns[idx].values.push(Some(value));
        }
        self.len += 1;
        for column in &mut self.columns {
            column.values.resize(self.len, None);
        }
    }

    /// Insert or replace a derived column at `position` (clamped to the
    /// column count). Values are padded or truncated to the row count.
    pub fn insert_column(
        &mut self,
        position: usize,
        name: impl Into<String>,
        values: impl IntoIterator<Item = String>,
    ) {
        let name = name.into();
        let mut values: Vec<Option<String>> = values.into_iter().map(Some).collect();
        values.resize(self.len, None);
        if let Some(existing) = self.columns.iter_mut().find(|c| c.name == name) {
            existing.values = values;
            return;
        }
        let position = position.min(self.columns.len());
        self.columns.insert(position, Column { name, values });
    }
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.table.get(self.index, column)
    }

    /// The cells this row sets, in column order.
    pub fn values(&self) -> RowValues {
        self.table
            .columns
            .iter()
            .filter_map(|c| {
                c.values[self.index]
                    .as_ref()
                    .map(|v| (c.name.clone(), v.clone()))
            })
            .collect()
    }
}

/// All tables of one document, keyed by upper-cased title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSet {
    tables: BTreeMap<String, Table>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&key(name))
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(&key(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(&key(name))
    }

    /// First table present among `names` (aliases used by different exporter
    /// versions).
    pub fn get_any(&self, names: &[&str]) -> Option<&Table> {
        names.iter().find_map(|name| self.get(name))
    }

    /// Open the table titled `title`, creating it if needed.
    pub fn open(&mut self, title: &str) -> &mut Table {
        self.tables
            .entry(key(title))
            .or_insert_with(|| Table::new(title))
    }

    pub fn insert(&mut self, table: Table) -> Option<Table> {
        self.tables.insert(key(table.name()), table)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Render back to S2K text, one `key=value` line per row. Values that are
    /// empty or contain whitespace are quoted.
    pub fn to_s2k_string(&self) -> String {
        let mut out = String::new();
        for table in self.tables.values() {
            let _ = writeln!(out, "TABLE:  \"{}\"", table.name());
            for row in table.rows() {
                let fields: Vec<String> = row
                    .values()
                    .into_iter()
                    .map(|(k, v)| format!("{k}={}", quote_value(&v)))
                    .collect();
                let _ = writeln!(out, "   {}", fields.join("   "));
            }
            out.push('\n');
        }
        out.push_str(END_OF_DATA);
        out.push('\n');
        out
    }
}

fn key(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

fn quote_value(value: &str) -> String {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
