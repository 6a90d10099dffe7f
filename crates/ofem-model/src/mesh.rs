//! Already-discretized meshes, as read from solver or mesh files.

#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub tag: usize,
    pub coords: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshCell {
    pub tag: usize,
    /// Mesh-format shape code
    pub code: i32,
    /// Node tags
    pub nodes: Vec<usize>,
}

/// Cells of one shape code, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeBlock<'a> {
    pub code: i32,
    pub cells: Vec<&'a MeshCell>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscreteMesh {
    pub title: String,
    pub nodes: Vec<MeshNode>,
    pub cells: Vec<MeshCell>,
    /// Tags of nodes with restrained degrees of freedom
    pub fixed_nodes: Vec<usize>,
}

impl DiscreteMesh {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Cells grouped by shape code, groups in first-seen order.
    pub fn shape_blocks(&self) -> Vec<ShapeBlock<'_>> {
        let mut blocks: Vec<ShapeBlock<'_>> = Vec::new();
        for cell in &self.cells {
            match blocks.iter_mut().find(|b| b.code == cell.code) {
                Some(block) => block.cells.push(cell),
                None => blocks.push(ShapeBlock {
                    code: cell.code,
                    cells: vec![cell],
                }),
            }
        }
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_keep_first_seen_order() {
        let mut mesh = DiscreteMesh::new("plate");
        for (tag, code) in [(1, 3), (2, 2), (3, 3)] {
            mesh.cells.push(MeshCell {
                tag,
                code,
                nodes: vec![],
            });
        }
        let blocks = mesh.shape_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].code, 3);
        assert_eq!(
            blocks[0].cells.iter().map(|c| c.tag).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(blocks[1].code, 2);
    }
}
