//! Structural model and discrete mesh export through a [`GeometryKernel`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use ofem_model::{DiscreteMesh, Element, ElementShape, StructuralModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::BridgeError;
use crate::kernel::GeometryKernel;

/// How elements are split into kernel entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityGrouping {
    /// One entity per element shape
    #[default]
    Types,
    /// One entity per section, elements batched by shape
    Sections,
    /// One entity per element
    Elements,
}

impl EntityGrouping {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Types => "types",
            Self::Sections => "sections",
            Self::Elements => "elements",
        }
    }
}

impl fmt::Display for EntityGrouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityGrouping {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "types" => Ok(Self::Types),
            "sections" => Ok(Self::Sections),
            "elements" => Ok(Self::Elements),
            _ => Err(BridgeError::InvalidGrouping(s.to_string())),
        }
    }
}

/// Drives a kernel from a [`StructuralModel`].
pub struct MeshExport<'a> {
    model: &'a StructuralModel,
    grouping: EntityGrouping,
    section_physicals: bool,
}

impl<'a> MeshExport<'a> {
    pub fn new(model: &'a StructuralModel) -> Self {
        Self {
            model,
            grouping: EntityGrouping::default(),
            section_physicals: false,
        }
    }

    pub fn grouping(mut self, grouping: EntityGrouping) -> Self {
        self.grouping = grouping;
        self
    }

    /// Emit one `section: <name>` physical group per section.
    pub fn section_physicals(mut self, enabled: bool) -> Self {
        self.section_physicals = enabled;
        self
    }

    pub fn export<K: GeometryKernel>(&self, kernel: &mut K) -> Result<(), BridgeError> {
        if self.section_physicals && self.grouping == EntityGrouping::Types {
            return Err(BridgeError::InvalidGrouping(self.grouping.to_string()));
        }
        let model = self.model;
        let shaped = model
            .elements()
            .iter()
            .map(|e| element_shape(e).map(|shape| (e, shape)))
            .collect::<Result<Vec<_>, _>>()?;

        let name = if model.title().is_empty() {
            "model"
        } else {
            model.title()
        };
        kernel.add_model(name)?;

        let points = kernel.add_discrete_entity(0)?;
        let tags: Vec<usize> = model.joints().iter().map(|j| j.tag).collect();
        let coords: Vec<f64> = model.joints().iter().flat_map(|j| j.coords).collect();
        kernel.add_nodes(0, points, &tags, &coords)?;

        match self.grouping {
            EntityGrouping::Types => export_by_type(kernel, &shaped)?,
            EntityGrouping::Sections => self.export_by_section(kernel, &shaped)?,
            EntityGrouping::Elements => self.export_by_element(kernel, &shaped)?,
        }
        info!(
            grouping = %self.grouping,
            elements = shaped.len(),
            "model exported to geometry kernel"
        );
        Ok(())
    }

    fn export_by_section<K: GeometryKernel>(
        &self,
        kernel: &mut K,
        shaped: &[(&Element, ElementShape)],
    ) -> Result<(), BridgeError> {
        for section in self.model.sections() {
            let members: Vec<_> = shaped
                .iter()
                .filter(|(e, _)| e.section == section.name)
                .copied()
                .collect();
            if members.is_empty() {
                continue;
            }
            let dim = section.category.dimension();
            let entity = kernel.add_discrete_entity(dim)?;
            kernel.set_entity_name(dim, entity, &section.name)?;
            for (shape, batch) in by_shape(&members) {
                add_batch(kernel, entity, shape, &batch)?;
            }
            if self.section_physicals {
                kernel.add_physical_group(dim, &[entity], &format!("section: {}", section.name))?;
            }
            debug!(section = %section.name, elements = members.len(), "section entity added");
        }
        Ok(())
    }

    fn export_by_element<K: GeometryKernel>(
        &self,
        kernel: &mut K,
        shaped: &[(&Element, ElementShape)],
    ) -> Result<(), BridgeError> {
        let mut entities = Vec::with_capacity(shaped.len());
        for &(element, shape) in shaped {
            let dim = shape.dimension();
            let entity = kernel.add_discrete_entity(dim)?;
            kernel.set_entity_name(dim, entity, &element.label)?;
            add_batch(kernel, entity, shape, &[element])?;
            entities.push((element, dim, entity));
        }

        if self.section_physicals {
            for section in self.model.sections() {
                let dim = section.category.dimension();
                let tags = entity_tags(&entities, dim, |e| e.section == section.name);
                if !tags.is_empty() {
                    kernel.add_physical_group(dim, &tags, &format!("section: {}", section.name))?;
                }
            }
        }
        for group in self.model.groups() {
            for dim in 0..=3 {
                let tags = entity_tags(&entities, dim, |e| e.groups.contains(&group.name));
                if !tags.is_empty() {
                    kernel.add_physical_group(dim, &tags, &format!("Group: {}", group.name))?;
                }
            }
        }
        Ok(())
    }
}

fn entity_tags(
    entities: &[(&Element, u8, i32)],
    dim: u8,
    keep: impl Fn(&Element) -> bool,
) -> Vec<i32> {
    entities
        .iter()
        .filter(|(e, d, _)| *d == dim && keep(*e))
        .map(|(_, _, tag)| *tag)
        .collect()
}

fn export_by_type<K: GeometryKernel>(
    kernel: &mut K,
    shaped: &[(&Element, ElementShape)],
) -> Result<(), BridgeError> {
    for (shape, batch) in by_shape(shaped) {
        let dim = shape.dimension();
        let entity = kernel.add_discrete_entity(dim)?;
        kernel.set_entity_name(dim, entity, shape.name())?;
        add_batch(kernel, entity, shape, &batch)?;
    }
    Ok(())
}

/// Elements grouped by shape, shapes in first-seen order.
fn by_shape<'e>(shaped: &[(&'e Element, ElementShape)]) -> Vec<(ElementShape, Vec<&'e Element>)> {
    let mut batches: Vec<(ElementShape, Vec<&Element>)> = Vec::new();
    for &(element, shape) in shaped {
        match batches.iter_mut().find(|(s, _)| *s == shape) {
            Some((_, batch)) => batch.push(element),
            None => batches.push((shape, vec![element])),
        }
    }
    batches
}

/// Mesh element tags are the model-wide deck tags, which never collide
/// across categories.
fn add_batch<K: GeometryKernel>(
    kernel: &mut K,
    entity: i32,
    shape: ElementShape,
    batch: &[&Element],
) -> Result<(), BridgeError> {
    let tags: Vec<usize> = batch.iter().map(|e| e.deck_tag).collect();
    let nodes: Vec<usize> = batch.iter().flat_map(|e| e.nodes.iter().copied()).collect();
    kernel.add_elements_by_type(entity, shape.mesh_code(), &tags, &nodes)
}

fn element_shape(element: &Element) -> Result<ElementShape, BridgeError> {
    element
        .shape()
        .ok_or_else(|| BridgeError::UnsupportedElementType {
            element: element.label.clone(),
            code: element.code,
        })
}

/// Load an already discretized mesh into `kernel`: one entity per shape
/// block, each node registered once on the first entity that uses it.
/// Nodes no cell references end up on a trailing point entity.
pub fn import_discrete<K: GeometryKernel>(
    mesh: &DiscreteMesh,
    kernel: &mut K,
) -> Result<(), BridgeError> {
    let name = if mesh.title.is_empty() {
        "mesh"
    } else {
        mesh.title.as_str()
    };
    kernel.add_model(name)?;

    let defined: HashMap<usize, [f64; 3]> = mesh.nodes.iter().map(|n| (n.tag, n.coords)).collect();
    let coords_of = |tag: usize| {
        defined
            .get(&tag)
            .copied()
            .ok_or_else(|| BridgeError::Kernel(format!("node {tag} is not defined")))
    };

    let mut registered = HashSet::new();
    for block in mesh.shape_blocks() {
        let shape = ElementShape::from_mesh_code(block.code).ok_or_else(|| {
            BridgeError::UnsupportedElementType {
                element: block.cells.first().map(|c| c.tag.to_string()).unwrap_or_default(),
                code: block.code,
            }
        })?;
        let dim = shape.dimension();
        let entity = kernel.add_discrete_entity(dim)?;
        kernel.set_entity_name(dim, entity, shape.name())?;

        let mut tags = Vec::new();
        let mut coords = Vec::new();
        for cell in &block.cells {
            for &node in &cell.nodes {
                if registered.insert(node) {
                    tags.push(node);
                    coords.extend(coords_of(node)?);
                }
            }
        }
        kernel.add_nodes(dim, entity, &tags, &coords)?;

        let cell_tags: Vec<usize> = block.cells.iter().map(|c| c.tag).collect();
        let nodes: Vec<usize> = block
            .cells
            .iter()
            .flat_map(|c| c.nodes.iter().copied())
            .collect();
        kernel.add_elements_by_type(entity, block.code, &cell_tags, &nodes)?;
    }

    let loose: Vec<_> = mesh
        .nodes
        .iter()
        .filter(|n| !registered.contains(&n.tag))
        .collect();
    if !loose.is_empty() {
        let entity = kernel.add_discrete_entity(0)?;
        let tags: Vec<usize> = loose.iter().map(|n| n.tag).collect();
        let coords: Vec<f64> = loose.iter().flat_map(|n| n.coords).collect();
        kernel.add_nodes(0, entity, &tags, &coords)?;
    }
    info!(
        nodes = mesh.nodes.len(),
        cells = mesh.cells.len(),
        "discrete mesh imported"
    );
    Ok(())
}
