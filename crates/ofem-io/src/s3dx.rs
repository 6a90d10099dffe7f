//! Reader for solver `.s3dx` mesh files.
//!
//! Layout: a header line, a title line, `nelems nnodes nspec`, then one line
//! per element (`n ntype nnode ... lnods`), per node (`tag x y z`) and per
//! special node (`i node`). Only the first block is read.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use ofem_model::{DiscreteMesh, ElementShape, MeshCell, MeshNode};
use tracing::debug;

use crate::error::MeshReadError;

struct LineCursor<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    last: usize,
}

impl<'a> LineCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            last: 0,
        }
    }

    fn next(&mut self, what: &str) -> Result<(usize, &'a str), MeshReadError> {
        match self.lines.next() {
            Some((i, line)) => {
                self.last = i + 1;
                Ok((i + 1, line))
            }
            None => Err(MeshReadError::Parse {
                line: self.last + 1,
                message: format!("unexpected end of file, expected {what}"),
            }),
        }
    }
}

fn field<T: FromStr>(tokens: &[&str], index: usize, line: usize, what: &str) -> Result<T, MeshReadError> {
    tokens
        .get(index)
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| MeshReadError::Parse {
            line,
            message: format!("invalid or missing {what}"),
        })
}

pub fn parse_s3dx(text: &str) -> Result<DiscreteMesh, MeshReadError> {
    let mut cursor = LineCursor::new(text);
    cursor.next("header")?;
    let (line, title) = cursor.next("title")?;
    let title = title.trim();
    if title.is_empty() {
        return Err(MeshReadError::Parse {
            line,
            message: "blank title, no mesh block".to_string(),
        });
    }

    let (line, counts) = cursor.next("element, node and special node counts")?;
    let counts: Vec<&str> = counts.split_whitespace().collect();
    let nelems: usize = field(&counts, 0, line, "element count")?;
    let nnodes: usize = field(&counts, 1, line, "node count")?;
    let nspec: usize = field(&counts, 2, line, "special node count")?;

    let mut mesh = DiscreteMesh::new(title);
    for _ in 0..nelems {
        let (line, text) = cursor.next("element")?;
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let tag: usize = field(&tokens, 0, line, "element number")?;
        let solver_type: u32 = field(&tokens, 1, line, "element type")?;
        let node_count: usize = field(&tokens, 2, line, "node count")?;
        if tokens.len() < 3 + node_count {
            return Err(MeshReadError::Parse {
                line,
                message: format!("expected {node_count} element nodes"),
            });
        }
        let shape = ElementShape::from_solver(solver_type, node_count).ok_or(
            MeshReadError::UnsupportedElementType {
                line,
                solver_type,
                node_count,
            },
        )?;
        let first = tokens.len() - node_count;
        let nodes = (first..tokens.len())
            .map(|i| field(&tokens, i, line, "node tag"))
            .collect::<Result<Vec<usize>, _>>()?;
        mesh.cells.push(MeshCell {
            tag,
            code: shape.mesh_code(),
            nodes,
        });
    }

    for _ in 0..nnodes {
        let (line, text) = cursor.next("node")?;
        let tokens: Vec<&str> = text.split_whitespace().collect();
        mesh.nodes.push(MeshNode {
            tag: field(&tokens, 0, line, "node tag")?,
            coords: [
                field(&tokens, 1, line, "x coordinate")?,
                field(&tokens, 2, line, "y coordinate")?,
                field(&tokens, 3, line, "z coordinate")?,
            ],
        });
    }

    for _ in 0..nspec {
        let (line, text) = cursor.next("special node")?;
        let tokens: Vec<&str> = text.split_whitespace().collect();
        mesh.fixed_nodes.push(field(&tokens, 1, line, "special node tag")?);
    }

    debug!(
        title = %mesh.title,
        elements = mesh.cells.len(),
        nodes = mesh.nodes.len(),
        "s3dx mesh parsed"
    );
    Ok(mesh)
}

pub fn read_s3dx(path: impl AsRef<Path>) -> Result<DiscreteMesh, MeshReadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| MeshReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_s3dx(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLATE: &str = "\
femix s3dx mesh
plate with edge beam
3 5 2
1 9 4 1 2 3 4
2 9 3 1 3 5
3 7 2 0 0 1 2
1 0.0 0.0 0.0
2 2.0 0.0 0.0
3 2.0 2.0 0.0
4 0.0 2.0 0.0
5 1.0 3.0 0.5
1 1
2 4
";

    #[test]
    fn parses_first_block() {
        let mesh = parse_s3dx(PLATE).expect("parse");
        assert_eq!(mesh.title, "plate with edge beam");
        assert_eq!(mesh.cells.len(), 3);
        assert_eq!(mesh.cells[0].code, ElementShape::Quad.mesh_code());
        assert_eq!(mesh.cells[1].code, ElementShape::Triangle.mesh_code());
        assert_eq!(mesh.cells[1].nodes, vec![1, 3, 5]);
        // trailing node list wins over any extra columns
        assert_eq!(mesh.cells[2].code, ElementShape::Line.mesh_code());
        assert_eq!(mesh.cells[2].nodes, vec![1, 2]);
        assert_eq!(mesh.nodes[4].coords, [1.0, 3.0, 0.5]);
        assert_eq!(mesh.fixed_nodes, vec![1, 4]);
    }

    #[test]
    fn unknown_type_reports_line() {
        let text = PLATE.replace("2 9 3 1 3 5", "2 31 3 1 3 5");
        let err = parse_s3dx(&text).expect_err("bad type");
        assert!(matches!(
            err,
            MeshReadError::UnsupportedElementType {
                line: 5,
                solver_type: 31,
                node_count: 3
            }
        ));
    }

    #[test]
    fn truncated_file_is_a_parse_error() {
        let text: String = PLATE.lines().take(8).map(|l| format!("{l}\n")).collect();
        let err = parse_s3dx(&text).expect_err("truncated");
        assert!(matches!(err, MeshReadError::Parse { line: 9, .. }));

        let err = parse_s3dx("header\n\n").expect_err("blank title");
        assert!(matches!(err, MeshReadError::Parse { line: 2, .. }));
    }

    #[test]
    fn bad_numbers_are_reported() {
        let text = PLATE.replace("3 2.0 2.0 0.0", "3 2.0 two 0.0");
        let err = parse_s3dx(&text).expect_err("bad coordinate");
        assert!(
            matches!(err, MeshReadError::Parse { line: 9, ref message } if message.contains("y coordinate"))
        );
    }

    #[test]
    fn read_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("plate_me.s3dx");
        fs::write(&path, PLATE).expect("write");
        assert_eq!(read_s3dx(&path).expect("read").cells.len(), 3);
        assert!(matches!(
            read_s3dx(dir.path().join("missing.s3dx")),
            Err(MeshReadError::Io { .. })
        ));
    }
}
