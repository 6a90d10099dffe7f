//! Geometry kernel boundary used by the mesh bridge.
//!
//! [`GeometryKernel`] mirrors the handful of discrete-mesh calls of a Gmsh
//! style API. [`InMemoryKernel`] records those calls and renders them as a
//! Gmsh 2.2 ASCII `.msh` file.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use ofem_model::ElementShape;
use tracing::info;

use crate::error::BridgeError;

/// Discrete-model operations needed to export a structural mesh.
///
/// Entity tags are numbered per dimension, as in Gmsh.
pub trait GeometryKernel {
    fn add_model(&mut self, name: &str) -> Result<(), BridgeError>;

    /// Create an empty discrete entity of dimension `dim`; returns its tag.
    fn add_discrete_entity(&mut self, dim: u8) -> Result<i32, BridgeError>;

    fn set_entity_name(&mut self, dim: u8, entity: i32, name: &str) -> Result<(), BridgeError>;

    /// `coords` holds three values per tag.
    fn add_nodes(
        &mut self,
        dim: u8,
        entity: i32,
        tags: &[usize],
        coords: &[f64],
    ) -> Result<(), BridgeError>;

    /// Add elements of mesh code `code`; `nodes` is the flattened
    /// connectivity. The entity dimension follows the element shape.
    fn add_elements_by_type(
        &mut self,
        entity: i32,
        code: i32,
        tags: &[usize],
        nodes: &[usize],
    ) -> Result<(), BridgeError>;

    /// Returns the physical group tag.
    fn add_physical_group(
        &mut self,
        dim: u8,
        entities: &[i32],
        name: &str,
    ) -> Result<i32, BridgeError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementBlock {
    pub code: i32,
    pub tags: Vec<usize>,
    pub nodes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub dim: u8,
    pub tag: i32,
    pub name: Option<String>,
    pub blocks: Vec<ElementBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalGroup {
    pub dim: u8,
    pub tag: i32,
    pub entities: Vec<i32>,
    pub name: String,
}

/// Recording kernel.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKernel {
    model: Option<String>,
    entities: Vec<Entity>,
    nodes: BTreeMap<usize, [f64; 3]>,
    physicals: Vec<PhysicalGroup>,
}

impl InMemoryKernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, dim: u8, tag: i32) -> Option<&Entity> {
        self.entities.iter().find(|e| e.dim == dim && e.tag == tag)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn element_count(&self) -> usize {
        self.blocks().map(|(_, b)| b.tags.len()).sum()
    }

    pub fn physical_groups(&self) -> &[PhysicalGroup] {
        &self.physicals
    }

    fn blocks(&self) -> impl Iterator<Item = (&Entity, &ElementBlock)> {
        self.entities
            .iter()
            .flat_map(|e| e.blocks.iter().map(move |b| (e, b)))
    }

    fn entity_mut(&mut self, dim: u8, tag: i32) -> Result<&mut Entity, BridgeError> {
        self.entities
            .iter_mut()
            .find(|e| e.dim == dim && e.tag == tag)
            .ok_or_else(|| BridgeError::Kernel(format!("no entity ({dim}, {tag})")))
    }

    fn physical_of(&self, entity: &Entity) -> i32 {
        self.physicals
            .iter()
            .find(|p| p.dim == entity.dim && p.entities.contains(&entity.tag))
            .map_or(0, |p| p.tag)
    }

    /// Render the recorded mesh as Gmsh 2.2 ASCII. Each element carries the
    /// first physical group of its entity (0 when none).
    pub fn render_msh(&self) -> String {
        let mut out = String::new();
        out.push_str("$MeshFormat\n2.2 0 8\n$EndMeshFormat\n");

        if !self.physicals.is_empty() {
            out.push_str("$PhysicalNames\n");
            let _ = writeln!(out, "{}", self.physicals.len());
            for p in &self.physicals {
                let _ = writeln!(out, "{} {} \"{}\"", p.dim, p.tag, p.name);
            }
            out.push_str("$EndPhysicalNames\n");
        }

        out.push_str("$Nodes\n");
        let _ = writeln!(out, "{}", self.nodes.len());
        for (tag, [x, y, z]) in &self.nodes {
            let _ = writeln!(out, "{tag} {x} {y} {z}");
        }
        out.push_str("$EndNodes\n");

        out.push_str("$Elements\n");
        let _ = writeln!(out, "{}", self.element_count());
        for (entity, block) in self.blocks() {
            let physical = self.physical_of(entity);
            let per_element = block.nodes.len() / block.tags.len().max(1);
            for (tag, nodes) in block.tags.iter().zip(block.nodes.chunks(per_element.max(1))) {
                let _ = write!(out, "{tag} {} 2 {physical} {}", block.code, entity.tag);
                for node in nodes {
                    let _ = write!(out, " {node}");
                }
                out.push('\n');
            }
        }
        out.push_str("$EndElements\n");
        out
    }

    pub fn write_msh(&self, path: impl AsRef<Path>) -> Result<(), BridgeError> {
        let path = path.as_ref();
        fs::write(path, self.render_msh()).map_err(|source| BridgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            nodes = self.node_count(),
            elements = self.element_count(),
            "msh file written"
        );
        Ok(())
    }
}

impl GeometryKernel for InMemoryKernel {
    fn add_model(&mut self, name: &str) -> Result<(), BridgeError> {
        *self = Self {
            model: Some(name.to_string()),
            ..Self::default()
        };
        Ok(())
    }

    fn add_discrete_entity(&mut self, dim: u8) -> Result<i32, BridgeError> {
        if dim > 3 {
            return Err(BridgeError::Kernel(format!("invalid entity dimension {dim}")));
        }
        let tag = self.entities.iter().filter(|e| e.dim == dim).count() as i32 + 1;
        self.entities.push(Entity {
            dim,
            tag,
            name: None,
            blocks: Vec::new(),
        });
        Ok(tag)
    }

    fn set_entity_name(&mut self, dim: u8, entity: i32, name: &str) -> Result<(), BridgeError> {
        self.entity_mut(dim, entity)?.name = Some(name.to_string());
        Ok(())
    }

    fn add_nodes(
        &mut self,
        dim: u8,
        entity: i32,
        tags: &[usize],
        coords: &[f64],
    ) -> Result<(), BridgeError> {
        self.entity_mut(dim, entity)?;
        if coords.len() != tags.len() * 3 {
            return Err(BridgeError::Kernel(format!(
                "{} coordinates given for {} nodes",
                coords.len(),
                tags.len()
            )));
        }
        for (tag, xyz) in tags.iter().zip(coords.chunks_exact(3)) {
            self.nodes.insert(*tag, [xyz[0], xyz[1], xyz[2]]);
        }
        Ok(())
    }

    fn add_elements_by_type(
        &mut self,
        entity: i32,
        code: i32,
        tags: &[usize],
        nodes: &[usize],
    ) -> Result<(), BridgeError> {
        let shape = ElementShape::from_mesh_code(code).ok_or_else(|| {
            BridgeError::UnsupportedElementType {
                element: tags.first().map(|t| t.to_string()).unwrap_or_default(),
                code,
            }
        })?;
        if nodes.len() != tags.len() * shape.node_count() {
            return Err(BridgeError::Kernel(format!(
                "{} node tags given for {} {} elements",
                nodes.len(),
                tags.len(),
                shape.name()
            )));
        }
        if tags.is_empty() {
            return Ok(());
        }
        let target = self.entity_mut(shape.dimension(), entity)?;
        target.blocks.push(ElementBlock {
            code,
            tags: tags.to_vec(),
            nodes: nodes.to_vec(),
        });
        Ok(())
    }

    fn add_physical_group(
        &mut self,
        dim: u8,
        entities: &[i32],
        name: &str,
    ) -> Result<i32, BridgeError> {
        for &entity in entities {
            self.entity_mut(dim, entity)?;
        }
        let tag = self.physicals.len() as i32 + 1;
        self.physicals.push(PhysicalGroup {
            dim,
            tag,
            entities: entities.to_vec(),
            name: name.to_string(),
        });
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> InMemoryKernel {
        let mut kernel = InMemoryKernel::new();
        kernel.add_model("square").expect("model");
        let points = kernel.add_discrete_entity(0).expect("points");
        kernel
            .add_nodes(
                0,
                points,
                &[4, 1, 2, 3],
                &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0],
            )
            .expect("nodes");
        let surface = kernel.add_discrete_entity(2).expect("surface");
        kernel
            .add_elements_by_type(surface, 2, &[1, 2], &[1, 2, 3, 1, 3, 4])
            .expect("elements");
        kernel
    }

    #[test]
    fn entity_tags_are_counted_per_dimension() {
        let mut kernel = two_triangles();
        assert_eq!(kernel.add_discrete_entity(2).expect("entity"), 2);
        assert_eq!(kernel.add_discrete_entity(1).expect("entity"), 1);
        assert!(kernel.add_discrete_entity(4).is_err());
    }

    #[test]
    fn renders_gmsh_22_with_sorted_nodes() {
        let mut kernel = two_triangles();
        kernel.add_physical_group(2, &[1], "section: SLAB").expect("physical");
        let msh = kernel.render_msh();
        let expected = "\
$MeshFormat
2.2 0 8
$EndMeshFormat
$PhysicalNames
1
2 1 \"section: SLAB\"
$EndPhysicalNames
$Nodes
4
1 0 0 0
2 1 0 0
3 1 1 0
4 0 1 0
$EndNodes
$Elements
2
1 2 2 1 1 1 2 3
2 2 2 1 1 1 3 4
$EndElements
";
        assert_eq!(msh, expected);
    }

    #[test]
    fn rejects_inconsistent_calls() {
        let mut kernel = two_triangles();
        assert!(matches!(
            kernel.add_elements_by_type(1, 2, &[3], &[1, 2]),
            Err(BridgeError::Kernel(_))
        ));
        assert!(matches!(
            kernel.add_elements_by_type(1, 77, &[3], &[1]),
            Err(BridgeError::UnsupportedElementType { code: 77, .. })
        ));
        // no curve entity exists yet
        assert!(kernel.add_elements_by_type(1, 1, &[3], &[1, 2]).is_err());
        assert!(kernel.set_entity_name(3, 1, "solid").is_err());
        assert!(kernel.add_nodes(0, 1, &[9], &[0.0]).is_err());
    }

    #[test]
    fn write_msh_creates_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("square.msh");
        two_triangles().write_msh(&path).expect("write");
        let text = fs::read_to_string(&path).expect("read");
        assert!(text.starts_with("$MeshFormat\n"));
        assert!(text.ends_with("$EndElements\n"));
    }
}
