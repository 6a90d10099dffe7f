//! Readers for post-processor result files: `;`-separated CSV tables
//! (`_rs.csv`, `_avgst.csv`, `_elst.csv`, `_di.csv`) and two-column
//! point/value `.pva` files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::ResultReadError;

/// A CSV result table. Values are kept as text; use
/// [`ResultTable::numbers`] for numeric columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }

    /// Parse every value of `column` as a number.
    pub fn numbers(&self, column: &str) -> Result<Vec<f64>, ResultReadError> {
        let index = self.column_index(column).ok_or_else(|| ResultReadError::Parse {
            line: 1,
            message: format!("no column '{column}'"),
        })?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row[index].parse().map_err(|_| ResultReadError::Parse {
                    line: i + 2,
                    message: format!("'{}' in column '{column}' is not a number", row[index]),
                })
            })
            .collect()
    }
}

fn split_fields(line: &str) -> Vec<String> {
    let line = line.trim_end();
    let line = line.strip_suffix(';').unwrap_or(line);
    line.split(';').map(|f| f.trim().to_string()).collect()
}

/// Parse a `;`-separated table with a header line. Blank lines are skipped.
pub fn parse_csv(text: &str) -> Result<ResultTable, ResultReadError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());
    let Some((_, header)) = lines.next() else {
        return Ok(ResultTable::default());
    };
    let columns = split_fields(header);

    let mut rows = Vec::new();
    for (i, line) in lines {
        let fields = split_fields(line);
        if fields.len() != columns.len() {
            return Err(ResultReadError::Parse {
                line: i + 1,
                message: format!("expected {} fields, found {}", columns.len(), fields.len()),
            });
        }
        rows.push(fields);
    }
    debug!(columns = columns.len(), rows = rows.len(), "csv result table parsed");
    Ok(ResultTable { columns, rows })
}

pub fn read_csv(path: impl AsRef<Path>) -> Result<ResultTable, ResultReadError> {
    parse_csv(&read_text(path.as_ref())?)
}

/// One record of a `.pva` file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointValue {
    pub point: usize,
    pub value: f64,
}

/// Parse whitespace-separated `point value` pairs.
pub fn parse_pva(text: &str) -> Result<Vec<PointValue>, ResultReadError> {
    let mut values = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        let (Some(point), Some(value)) = (tokens.next(), tokens.next()) else {
            if line.trim().is_empty() {
                continue;
            }
            return Err(ResultReadError::Parse {
                line: i + 1,
                message: "expected point and value".to_string(),
            });
        };
        let parse_err = |what: &str| ResultReadError::Parse {
            line: i + 1,
            message: format!("invalid {what}"),
        };
        values.push(PointValue {
            point: point.parse().map_err(|_| parse_err("point"))?,
            value: value.parse().map_err(|_| parse_err("value"))?,
        });
    }
    Ok(values)
}

pub fn read_pva(path: impl AsRef<Path>) -> Result<Vec<PointValue>, ResultReadError> {
    parse_pva(&read_text(path.as_ref())?)
}

fn read_text(path: &Path) -> Result<String, ResultReadError> {
    fs::read_to_string(path).map_err(|source| ResultReadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISPLACEMENTS: &str = "\
point; disp-x; disp-y; disp-z;
1; 0.000E+00; 0.000E+00; 0.000E+00;

2; 1.250E-03; -2.0E-04; -7.5E-03;
";

    #[test]
    fn csv_header_and_rows() {
        let table = parse_csv(DISPLACEMENTS).expect("parse");
        assert_eq!(table.columns(), &["point", "disp-x", "disp-y", "disp-z"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(1, "disp-z"), Some("-7.5E-03"));
        assert_eq!(table.value(5, "disp-z"), None);
        assert_eq!(
            table.numbers("disp-x").expect("numbers"),
            vec![0.0, 1.25e-3]
        );
    }

    #[test]
    fn csv_errors_carry_line_numbers() {
        let err = parse_csv("a;b\n1;2\n3\n").expect_err("short row");
        assert!(matches!(err, ResultReadError::Parse { line: 3, .. }));

        let table = parse_csv("a;b\n1;x\n").expect("parse");
        let err = table.numbers("b").expect_err("not numeric");
        assert!(matches!(err, ResultReadError::Parse { line: 2, .. }));
        assert!(table.numbers("c").is_err());
        assert!(parse_csv("").expect("empty").is_empty());
    }

    #[test]
    fn pva_pairs() {
        let values = parse_pva("  1   0.5\n2 -1.0E-02\n\n").expect("parse");
        assert_eq!(
            values,
            vec![
                PointValue { point: 1, value: 0.5 },
                PointValue { point: 2, value: -0.01 },
            ]
        );
        let err = parse_pva("1 0.5\n2\n").expect_err("missing value");
        assert!(matches!(err, ResultReadError::Parse { line: 2, .. }));
        assert!(parse_pva("x 0.5").is_err());
    }

    #[test]
    fn readers_report_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("job_di.csv");
        assert!(matches!(read_csv(&path), Err(ResultReadError::Io { .. })));
        fs::write(&path, DISPLACEMENTS).expect("write");
        assert_eq!(read_csv(&path).expect("read").len(), 2);
        let pva = dir.path().join("job_di.pva");
        fs::write(&pva, "1 2.0\n").expect("write");
        assert_eq!(read_pva(&pva).expect("read").len(), 1);
    }
}
