//! The in-memory structural model.

use std::collections::{HashMap, HashSet};

use ofem_s2k::TableSet;
use tracing::{debug, info};

use crate::defaults::ModelDefaults;
use crate::entities::{
    BoundaryEntry, Element, Group, Joint, Material, MaterialCategory, MaterialProps, Section,
};
use crate::error::{ModelError, Result};
use crate::mesh::DiscreteMesh;
use crate::registry::{ElementCategory, ElementShape};

/// Joints, elements, sections, materials, groups and restraints of one
/// structure. Built once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct StructuralModel {
    pub(crate) title: String,
    pub(crate) tables: TableSet,
    pub(crate) joints: Vec<Joint>,
    pub(crate) joint_index: HashMap<String, usize>,
    pub(crate) elements: Vec<Element>,
    pub(crate) sections: Vec<Section>,
    pub(crate) materials: Vec<Material>,
    pub(crate) groups: Vec<Group>,
    pub(crate) boundaries: Vec<BoundaryEntry>,
}

impl StructuralModel {
    /// Build a model from an already discretized mesh. Every cell receives
    /// the default section of its category.
    pub fn from_mesh(mesh: &DiscreteMesh, defaults: &ModelDefaults) -> Result<Self> {
        let mut model = Self {
            title: mesh.title.clone(),
            ..Self::default()
        };

        for node in &mesh.nodes {
            model.add_joint(node.tag.to_string(), node.coords)?;
        }

        let mut cells = Vec::with_capacity(mesh.cells.len());
        for cell in &mesh.cells {
            let shape = ElementShape::from_mesh_code(cell.code)
                .ok_or(ModelError::UnsupportedElementType { code: cell.code })?;
            if cell.nodes.len() != shape.node_count() {
                return Err(ModelError::InvalidValue {
                    table: "mesh".to_string(),
                    row: cell.tag,
                    column: "nodes".to_string(),
                    value: cell.nodes.len().to_string(),
                });
            }
            cells.push((shape, cell));
        }
        cells.sort_by_key(|(shape, _)| shape.dimension());

        let mut seen: HashSet<(ElementCategory, usize)> = HashSet::new();
        let mut per_category: HashMap<ElementCategory, usize> = HashMap::new();
        for (shape, cell) in cells {
            let category = shape.category();
            if !seen.insert((category, cell.tag)) {
                return Err(ModelError::DuplicateEntity {
                    kind: "cell",
                    label: cell.tag.to_string(),
                });
            }
            let owner = format!("cell {}", cell.tag);
            let nodes = cell
                .nodes
                .iter()
                .map(|n| model.resolve_joint(&n.to_string(), &owner))
                .collect::<Result<Vec<_>>>()?;
            let section = model.default_section(category, defaults);
            let counter = per_category.entry(category).or_insert(0);
            *counter += 1;
            let deck_tag = model.elements.len() + 1;
            model.elements.push(Element {
                label: cell.tag.to_string(),
                category,
                code: shape.mesh_code(),
                nodes,
                tag: *counter,
                deck_tag,
                section,
                groups: Vec::new(),
            });
        }

        for node in &mesh.fixed_nodes {
            let joint = model.resolve_joint(&node.to_string(), "fixed node list")?;
            model.boundaries.push(BoundaryEntry::fixed(joint));
        }

        model.check()?;
        info!(
            joints = model.joint_count(),
            elements = model.element_count(),
            "structural model built from mesh"
        );
        Ok(model)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Source tables, including the derived `JoinTag`/`ElemTag` columns.
    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Frame elements first, then areas; deck tags follow this order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn frames(&self) -> impl Iterator<Item = &Element> {
        self.of_category(ElementCategory::Line)
    }

    pub fn areas(&self) -> impl Iterator<Item = &Element> {
        self.of_category(ElementCategory::Area)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn boundaries(&self) -> &[BoundaryEntry] {
        &self.boundaries
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frames().count()
    }

    pub fn area_count(&self) -> usize {
        self.areas().count()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn joint_tag(&self, label: &str) -> Option<usize> {
        self.joint_index.get(label).copied()
    }

    pub fn joint(&self, tag: usize) -> Option<&Joint> {
        tag.checked_sub(1).and_then(|i| self.joints.get(i))
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    fn of_category(&self, category: ElementCategory) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.category == category)
    }

    pub(crate) fn add_joint(&mut self, label: String, coords: [f64; 3]) -> Result<usize> {
        let tag = self.joints.len() + 1;
        if self.joint_index.insert(label.clone(), tag).is_some() {
            return Err(ModelError::DuplicateEntity {
                kind: "joint",
                label,
            });
        }
        self.joints.push(Joint { label, tag, coords });
        Ok(tag)
    }

    pub(crate) fn resolve_joint(&self, label: &str, owner: &str) -> Result<usize> {
        self.joint_tag(label).ok_or_else(|| ModelError::MissingReference {
            kind: "joint",
            label: label.to_string(),
            owner: owner.to_string(),
        })
    }

    pub(crate) fn push_section(&mut self, mut section: Section) -> Result<()> {
        if self.section(&section.name).is_some() {
            return Err(ModelError::DuplicateEntity {
                kind: "section",
                label: section.name,
            });
        }
        section.index = self.sections.len() + 1;
        self.sections.push(section);
        Ok(())
    }

    /// Add `name` unless a material of that name exists already.
    pub(crate) fn ensure_material(
        &mut self,
        name: &str,
        category: MaterialCategory,
        props: MaterialProps,
    ) {
        if self.material(name).is_none() {
            let index = self.materials.len() + 1;
            self.materials.push(Material {
                name: name.to_string(),
                category,
                props,
                index,
            });
        }
    }

    /// Name of the fallback section of `category`, creating the section and
    /// its material on first use.
    pub(crate) fn default_section(
        &mut self,
        category: ElementCategory,
        defaults: &ModelDefaults,
    ) -> String {
        let name = ModelDefaults::section_name(category);
        if self.section(&name).is_none() {
            let template = defaults.section(category);
            let material_category = MaterialCategory::for_elements(category);
            self.ensure_material(
                &template.material,
                material_category,
                defaults.material(material_category).clone(),
            );
            debug!(section = %name, material = %template.material, "using default section");
            self.sections.push(Section {
                name: name.clone(),
                category,
                geometry: template.geometry(category),
                material: template.material.clone(),
                index: self.sections.len() + 1,
            });
        }
        name
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.elements.is_empty() {
            return Err(ModelError::NoElements);
        }
        Ok(())
    }
}
