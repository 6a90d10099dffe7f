//! Model construction from S2K tables.

use std::collections::HashMap;

use ofem_s2k::{Row, Table, TableSet};
use tracing::{debug, info, warn};

use crate::defaults::ModelDefaults;
use crate::entities::{
    BoundaryEntry, Element, Fixity, Group, MaterialCategory, MaterialProps, Section,
    SectionGeometry,
};
use crate::error::{ModelError, Result};
use crate::model::StructuralModel;
use crate::registry::{ElementCategory, ElementShape};

pub const JOINT_COORDINATES: &str = "JOINT COORDINATES";
pub const FRAME_CONNECTIVITY: &str = "CONNECTIVITY - FRAME";
pub const AREA_CONNECTIVITY: &str = "CONNECTIVITY - AREA";
pub const FRAME_ASSIGNMENTS: &str = "FRAME SECTION ASSIGNMENTS";
pub const AREA_ASSIGNMENTS: &str = "AREA SECTION ASSIGNMENTS";
pub const FRAME_PROPERTIES: [&str; 2] = [
    "FRAME PROPS 01 - GENERAL",
    "FRAME SECTION PROPERTIES 01 - GENERAL",
];
pub const AREA_PROPERTIES: &str = "AREA SECTION PROPERTIES";
pub const MATERIAL_GENERAL: [&str; 2] = ["MATPROP 01 - GENERAL", "MATERIAL PROPERTIES 01 - GENERAL"];
pub const MATERIAL_MECHANICAL: [&str; 2] = [
    "MATPROP 02 - BASIC MECHANICAL PROPERTIES",
    "MATERIAL PROPERTIES 02 - BASIC MECHANICAL PROPERTIES",
];
pub const GROUP_DEFINITIONS: &str = "GROUPS 1 - DEFINITIONS";
pub const GROUP_ASSIGNMENTS: &str = "GROUPS 2 - ASSIGNMENTS";
pub const JOINT_RESTRAINTS: &str = "JOINT RESTRAINT ASSIGNMENTS";

const JOINT_TAG: &str = "JoinTag";
const ELEMENT_TAG: &str = "ElemTag";

/// Cell accessors that report the offending table, row and column.
struct Cells<'a> {
    table: &'a Table,
    row: Row<'a>,
}

impl<'a> Cells<'a> {
    fn invalid(&self, column: &str, value: &str) -> ModelError {
        ModelError::InvalidValue {
            table: self.table.name().to_string(),
            row: self.row.index() + 1,
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    fn opt(&self, column: &str) -> Option<&'a str> {
        self.row.get(column).map(str::trim).filter(|v| !v.is_empty())
    }

    fn text(&self, column: &str) -> Result<&'a str> {
        self.opt(column).ok_or_else(|| self.invalid(column, ""))
    }

    fn number(&self, column: &str) -> Result<f64> {
        let raw = self.text(column)?;
        raw.parse().map_err(|_| self.invalid(column, raw))
    }

    fn opt_number(&self, column: &str) -> Result<Option<f64>> {
        self.opt(column)
            .map(|raw| raw.parse().map_err(|_| self.invalid(column, raw)))
            .transpose()
    }
}

fn cells(table: &Table) -> impl Iterator<Item = Cells<'_>> {
    table.rows().map(move |row| Cells { table, row })
}

/// Absent, empty or `nan` marks a missing fourth area joint.
fn is_absent(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.eq_ignore_ascii_case("nan"))
}

fn yes(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("yes") || v == "1")
}

impl StructuralModel {
    /// Build a model from parsed S2K tables.
    ///
    /// Requires `JOINT COORDINATES`; every other table is optional. Elements
    /// without a section assignment and sections of a model without material
    /// tables fall back to `defaults`.
    pub fn from_tables(mut tables: TableSet, defaults: &ModelDefaults) -> Result<Self> {
        let mut model = StructuralModel::default();

        let joints = tables
            .get(JOINT_COORDINATES)
            .ok_or_else(|| ModelError::MissingTable(JOINT_COORDINATES.to_string()))?;
        for row in cells(joints) {
            let label = row.text("Joint")?.to_string();
            let coords = [row.number("XorR")?, row.number("Y")?, row.number("Z")?];
            model.add_joint(label, coords)?;
        }

        let mut index: HashMap<(ElementCategory, String), usize> = HashMap::new();
        if let Some(frames) = tables.get(FRAME_CONNECTIVITY) {
            for (i, row) in cells(frames).enumerate() {
                let label = row.text("Frame")?.to_string();
                let owner = format!("frame {label}");
                let nodes = vec![
                    model.resolve_joint(row.text("JointI")?, &owner)?,
                    model.resolve_joint(row.text("JointJ")?, &owner)?,
                ];
                model.push_element(&mut index, label, ElementShape::Line, nodes, i + 1, "frame")?;
            }
        }
        if let Some(areas) = tables.get(AREA_CONNECTIVITY) {
            for (i, row) in cells(areas).enumerate() {
                let label = row.text("Area")?.to_string();
                let owner = format!("area {label}");
                let mut nodes = Vec::with_capacity(4);
                for column in ["Joint1", "Joint2", "Joint3"] {
                    nodes.push(model.resolve_joint(row.text(column)?, &owner)?);
                }
                let fourth = row.opt("Joint4");
                let shape = if is_absent(fourth) {
                    ElementShape::Triangle
                } else {
                    nodes.push(model.resolve_joint(row.text("Joint4")?, &owner)?);
                    ElementShape::Quad
                };
                model.push_element(&mut index, label, shape, nodes, i + 1, "area")?;
            }
        }

        model.read_sections(&tables, defaults)?;
        model.assign_sections(&tables, &index, defaults)?;
        model.read_groups(&tables, &index)?;
        model.read_restraints(&tables)?;
        model.check()?;

        insert_tag_columns(&mut tables, &model);
        model.tables = tables;

        info!(
            joints = model.joint_count(),
            frames = model.frame_count(),
            areas = model.area_count(),
            sections = model.sections.len(),
            materials = model.materials.len(),
            "structural model built"
        );
        Ok(model)
    }

    fn push_element(
        &mut self,
        index: &mut HashMap<(ElementCategory, String), usize>,
        label: String,
        shape: ElementShape,
        nodes: Vec<usize>,
        tag: usize,
        kind: &'static str,
    ) -> Result<()> {
        let category = shape.category();
        let position = self.elements.len();
        if index.insert((category, label.clone()), position).is_some() {
            return Err(ModelError::DuplicateEntity { kind, label });
        }
        self.elements.push(Element {
            label,
            category,
            code: shape.mesh_code(),
            nodes,
            tag,
            deck_tag: position + 1,
            section: String::new(),
            groups: Vec::new(),
        });
        Ok(())
    }

    fn read_sections(&mut self, tables: &TableSet, defaults: &ModelDefaults) -> Result<()> {
        let mut defined: Vec<Section> = Vec::new();
        if let Some(frames) = tables.get_any(&FRAME_PROPERTIES) {
            for row in cells(frames) {
                defined.push(Section {
                    name: row.text("SectionName")?.to_string(),
                    category: ElementCategory::Line,
                    geometry: SectionGeometry::Frame {
                        area: row.opt_number("Area")?.unwrap_or(0.0),
                        torsion: row.opt_number("TorsConst")?.unwrap_or(0.0),
                        inertia2: row.opt_number("I22")?.unwrap_or(0.0),
                        inertia3: row.opt_number("I33")?.unwrap_or(0.0),
                        angle: 0.0,
                    },
                    material: material_name(&row, ElementCategory::Line, defaults),
                    index: 0,
                });
            }
        }
        if let Some(areas) = tables.get(AREA_PROPERTIES) {
            for row in cells(areas) {
                let thickness = match row.opt_number("Thickness")? {
                    Some(t) => t,
                    None => row.opt_number("Thick")?.unwrap_or(0.0),
                };
                defined.push(Section {
                    name: row.text("Section")?.to_string(),
                    category: ElementCategory::Area,
                    geometry: SectionGeometry::Shell { thickness },
                    material: material_name(&row, ElementCategory::Area, defaults),
                    index: 0,
                });
            }
        }

        let materials = read_materials(tables)?;
        for section in defined {
            let category = MaterialCategory::for_elements(section.category);
            match &materials {
                Some(table) => {
                    let props = table.get(&section.material).ok_or_else(|| {
                        ModelError::MissingReference {
                            kind: "material",
                            label: section.material.clone(),
                            owner: format!("section {}", section.name),
                        }
                    })?;
                    self.ensure_material(&section.material, category, props.clone());
                }
                None => {
                    debug!(material = %section.material, "no material tables; using defaults");
                    self.ensure_material(
                        &section.material,
                        category,
                        defaults.material(category).clone(),
                    );
                }
            }
            self.push_section(section)?;
        }
        Ok(())
    }

    fn assign_sections(
        &mut self,
        tables: &TableSet,
        index: &HashMap<(ElementCategory, String), usize>,
        defaults: &ModelDefaults,
    ) -> Result<()> {
        let sources = [
            (FRAME_ASSIGNMENTS, ElementCategory::Line, "Frame", "AnalSect", "frame"),
            (AREA_ASSIGNMENTS, ElementCategory::Area, "Area", "Section", "area"),
        ];
        for (name, category, label_column, section_column, kind) in sources {
            let Some(table) = tables.get(name) else {
                continue;
            };
            for row in cells(table) {
                let label = row.text(label_column)?;
                let section = row.text(section_column)?;
                let position = *index.get(&(category, label.to_string())).ok_or_else(|| {
                    ModelError::MissingReference {
                        kind,
                        label: label.to_string(),
                        owner: table.name().to_string(),
                    }
                })?;
                if self.section(section).is_none() {
                    return Err(ModelError::MissingReference {
                        kind: "section",
                        label: section.to_string(),
                        owner: format!("{kind} {label}"),
                    });
                }
                self.elements[position].section = section.to_string();
            }
        }

        for position in 0..self.elements.len() {
            if self.elements[position].section.is_empty() {
                let category = self.elements[position].category;
                let section = self.default_section(category, defaults);
                self.elements[position].section = section;
            }
        }
        Ok(())
    }

    fn read_groups(
        &mut self,
        tables: &TableSet,
        index: &HashMap<(ElementCategory, String), usize>,
    ) -> Result<()> {
        if let Some(definitions) = tables.get(GROUP_DEFINITIONS) {
            for row in cells(definitions) {
                let name = row.text("GroupName")?;
                if self.group(name).is_some() {
                    return Err(ModelError::DuplicateEntity {
                        kind: "group",
                        label: name.to_string(),
                    });
                }
                self.groups.push(Group::new(name));
            }
        }

        let Some(assignments) = tables.get(GROUP_ASSIGNMENTS) else {
            return Ok(());
        };
        for row in cells(assignments) {
            let name = row.text("GroupName")?;
            let object = row.text("ObjectType")?;
            let label = row.text("ObjectLabel")?;
            let category = match object.to_ascii_lowercase().as_str() {
                "joint" => ElementCategory::Point,
                "frame" => ElementCategory::Line,
                "area" => ElementCategory::Area,
                _ => {
                    warn!(group = name, object, "unsupported group member type skipped");
                    continue;
                }
            };

            if category == ElementCategory::Point {
                self.resolve_joint(label, &format!("group {name}"))?;
            } else {
                let position = *index.get(&(category, label.to_string())).ok_or_else(|| {
                    ModelError::MissingReference {
                        kind: if category == ElementCategory::Line { "frame" } else { "area" },
                        label: label.to_string(),
                        owner: format!("group {name}"),
                    }
                })?;
                let groups = &mut self.elements[position].groups;
                if !groups.iter().any(|g| g == name) {
                    groups.push(name.to_string());
                }
            }

            let group = match self.groups.iter().position(|g| g.name == name) {
                Some(i) => &mut self.groups[i],
                None => {
                    debug!(group = name, "group assigned before definition");
                    self.groups.push(Group::new(name));
                    let last = self.groups.len() - 1;
                    &mut self.groups[last]
                }
            };
            group.members.push((category, label.to_string()));
        }
        Ok(())
    }

    fn read_restraints(&mut self, tables: &TableSet) -> Result<()> {
        let Some(table) = tables.get(JOINT_RESTRAINTS) else {
            return Ok(());
        };
        for row in cells(table) {
            let label = row.text("Joint")?;
            let joint = self.resolve_joint(label, table.name())?;
            let mut entry = BoundaryEntry {
                joint,
                dofs: [Fixity::Free; 6],
            };
            for (dof, column) in ["U1", "U2", "U3", "R1", "R2", "R3"].iter().enumerate() {
                if yes(row.opt(column)) {
                    entry.dofs[dof] = Fixity::Fixed;
                }
            }
            if entry.is_restrained() {
                self.boundaries.push(entry);
            }
        }
        Ok(())
    }
}

fn material_name(row: &Cells<'_>, category: ElementCategory, defaults: &ModelDefaults) -> String {
    row.opt("Material")
        .map(str::to_string)
        .unwrap_or_else(|| defaults.section(category).material.clone())
}

/// Material properties by name, or `None` when the model carries no
/// material tables at all.
fn read_materials(tables: &TableSet) -> Result<Option<HashMap<String, MaterialProps>>> {
    let general = tables.get_any(&MATERIAL_GENERAL);
    let mechanical = tables.get_any(&MATERIAL_MECHANICAL);
    if general.is_none() && mechanical.is_none() {
        return Ok(None);
    }

    let mut materials: HashMap<String, MaterialProps> = HashMap::new();
    if let Some(table) = general {
        for row in cells(table) {
            let props = materials.entry(row.text("Material")?.to_string()).or_default();
            props.design = row.opt("Type").map(str::to_string);
        }
    }
    if let Some(table) = mechanical {
        for row in cells(table) {
            let props = materials.entry(row.text("Material")?.to_string()).or_default();
            props.weight = row.opt_number("UnitWeight")?;
            props.mass = row.opt_number("UnitMass")?;
            props.young = row.opt_number("E1")?;
            props.shear = row.opt_number("G12")?;
            props.poisson = row.opt_number("U12")?;
            props.thermal = row.opt_number("A1")?;
        }
    }
    Ok(Some(materials))
}

fn insert_tag_columns(tables: &mut TableSet, model: &StructuralModel) {
    if let Some(joints) = tables.get_mut(JOINT_COORDINATES) {
        joints.insert_column(0, JOINT_TAG, model.joints().iter().map(|j| j.tag.to_string()));
    }
    let sources = [
        (FRAME_CONNECTIVITY, ElementCategory::Line),
        (AREA_CONNECTIVITY, ElementCategory::Area),
    ];
    for (name, category) in sources {
        if let Some(table) = tables.get_mut(name) {
            let tags = model
                .elements()
                .iter()
                .filter(|e| e.category == category)
                .map(|e| e.tag.to_string());
            table.insert_column(1, ELEMENT_TAG, tags);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ofem_s2k::S2kReader;

    fn build(src: &str) -> Result<StructuralModel> {
        let tables = S2kReader::parse_str(src).expect("tables should parse");
        StructuralModel::from_tables(tables, &ModelDefaults::default())
    }

    const TWO_JOINT_FRAME: &str = r#"
TABLE:  "JOINT COORDINATES"
   Joint=1   XorR=0   Y=0   Z=0
   Joint=2   XorR=1   Y=0   Z=0
TABLE:  "CONNECTIVITY - FRAME"
   Frame=1   JointI=1   JointJ=2
"#;

    const SLAB: &str = r#"
TABLE:  "JOINT COORDINATES"
   Joint=A   XorR=0   Y=0   Z=3
   Joint=B   XorR=4   Y=0   Z=3
   Joint=C   XorR=4   Y=4   Z=3
   Joint=D   XorR=0   Y=4   Z=3
   Joint=E   XorR=0   Y=0   Z=0
TABLE:  "JOINT RESTRAINT ASSIGNMENTS"
   Joint=E   U1=Yes   U2=Yes   U3=Yes   R1=No   R2=No   R3=No
   Joint=A   U1=No    U2=No    U3=No    R1=No   R2=No   R3=No
TABLE:  "CONNECTIVITY - FRAME"
   Frame=C1   JointI=E   JointJ=A
TABLE:  "CONNECTIVITY - AREA"
   Area=S1   NumJoints=4   Joint1=A   Joint2=B   Joint3=C   Joint4=D
   Area=S2   NumJoints=3   Joint1=A   Joint2=C   Joint3=D   Joint4=nan
TABLE:  "FRAME SECTION ASSIGNMENTS"
   Frame=C1   AnalSect=COL30
TABLE:  "AREA SECTION ASSIGNMENTS"
   Area=S1   Section=SLAB20
TABLE:  "FRAME SECTION PROPERTIES 01 - GENERAL"
   SectionName=COL30   Material=C30   Area=0.09   TorsConst=0.0011   I33=0.000675   I22=0.000675
TABLE:  "AREA SECTION PROPERTIES"
   Section=SLAB20   Material=C30   Thickness=0.2
TABLE:  "MATERIAL PROPERTIES 01 - GENERAL"
   Material=C30   Type=Concrete
   Material=S275  Type=Steel
TABLE:  "MATERIAL PROPERTIES 02 - BASIC MECHANICAL PROPERTIES"
   Material=C30   UnitWeight=24.5   UnitMass=2.5   E1=33000000   G12=13750000   U12=0.2   A1=1E-05
TABLE:  "GROUPS 1 - DEFINITIONS"
   GroupName=ALL
   GroupName="Top Slab"
TABLE:  "GROUPS 2 - ASSIGNMENTS"
   GroupName="Top Slab"   ObjectType=Area   ObjectLabel=S1
   GroupName="Top Slab"   ObjectType=Area   ObjectLabel=S2
   GroupName=ALL   ObjectType=Joint   ObjectLabel=E
"#;

    #[test]
    fn two_joint_frame() {
        let model = build(TWO_JOINT_FRAME).expect("model should build");
        assert_eq!(model.joint_count(), 2);
        assert_eq!(model.frame_count(), 1);
        assert_eq!(model.area_count(), 0);
        let frame = &model.elements()[0];
        assert_eq!(frame.nodes, vec![1, 2]);
        assert_eq!(frame.tag, 1);
        assert_eq!(frame.shape(), Some(ElementShape::Line));
        assert_eq!(frame.section, "DEFAULT_CURVE");
        assert_eq!(model.materials().len(), 1);
        assert_eq!(model.materials()[0].name, "steel");
    }

    #[test]
    fn derived_tag_columns_are_inserted() {
        let model = build(TWO_JOINT_FRAME).expect("model should build");
        let joints = model.tables().get(JOINT_COORDINATES).expect("joints");
        assert_eq!(joints.column_names().next(), Some(JOINT_TAG));
        assert_eq!(joints.get(1, JOINT_TAG), Some("2"));
        let frames = model.tables().get(FRAME_CONNECTIVITY).expect("frames");
        assert_eq!(frames.column_names().nth(1), Some(ELEMENT_TAG));
        assert_eq!(frames.get(0, ELEMENT_TAG), Some("1"));
    }

    #[test]
    fn slab_model_resolves_everything() {
        let model = build(SLAB).expect("model should build");
        assert_eq!(model.joint_count(), 5);
        assert_eq!(model.joint_tag("C"), Some(3));
        assert_eq!(model.frame_count(), 1);
        assert_eq!(model.area_count(), 2);

        let quad = &model.elements()[1];
        assert_eq!(quad.shape(), Some(ElementShape::Quad));
        assert_eq!(quad.nodes, vec![1, 2, 3, 4]);
        assert_eq!(quad.deck_tag, 2);
        assert_eq!(quad.section, "SLAB20");

        let tri = &model.elements()[2];
        assert_eq!(tri.shape(), Some(ElementShape::Triangle));
        assert_eq!(tri.nodes, vec![1, 3, 4]);
        assert_eq!(tri.tag, 2);
        assert_eq!(tri.section, "DEFAULT_AREA");
        assert_eq!(tri.groups, vec!["Top Slab".to_string()]);

        let col = model.section("COL30").expect("frame section");
        assert_eq!(col.index, 1);
        assert!(matches!(col.geometry, SectionGeometry::Frame { area, .. } if area == 0.09));
        let slab = model.section("SLAB20").expect("area section");
        assert_eq!(slab.geometry, SectionGeometry::Shell { thickness: 0.2 });

        let c30 = model.material("C30").expect("material");
        assert_eq!(c30.props.young, Some(33_000_000.0));
        assert_eq!(c30.props.design.as_deref(), Some("Concrete"));
        assert_eq!(c30.category, MaterialCategory::Curve);
        assert!(model.material("S275").is_none());
        assert!(model.material("concrete").is_some());

        assert_eq!(model.boundaries(), &[BoundaryEntry::hinged(5)]);
        assert_eq!(model.group("ALL").map(|g| g.members.len()), Some(1));
        assert_eq!(model.group("Top Slab").map(|g| g.members.len()), Some(2));
    }

    #[test]
    fn missing_joint_table_is_reported() {
        let err = build("TABLE: \"CONNECTIVITY - FRAME\"\n Frame=1 JointI=1 JointJ=2\n")
            .expect_err("should fail");
        assert!(matches!(err, ModelError::MissingTable(name) if name == JOINT_COORDINATES));
    }

    #[test]
    fn duplicate_joint_label_is_rejected() {
        let src = "TABLE: \"JOINT COORDINATES\"\n Joint=1 XorR=0 Y=0 Z=0\n Joint=1 XorR=1 Y=0 Z=0\n";
        let err = build(src).expect_err("should fail");
        assert!(matches!(err, ModelError::DuplicateEntity { kind: "joint", .. }));
    }

    #[test]
    fn duplicate_frame_label_is_rejected() {
        let src = format!("{TWO_JOINT_FRAME}   Frame=1   JointI=2   JointJ=1\n");
        let err = build(&src).expect_err("should fail");
        assert!(matches!(err, ModelError::DuplicateEntity { kind: "frame", .. }));
    }

    #[test]
    fn dangling_joint_is_rejected() {
        let src = TWO_JOINT_FRAME.replace("JointJ=2", "JointJ=9");
        let err = build(&src).expect_err("should fail");
        assert!(matches!(
            err,
            ModelError::MissingReference { kind: "joint", ref label, .. } if label == "9"
        ));
    }

    #[test]
    fn undefined_section_and_material_are_rejected() {
        let src = SLAB.replace("AnalSect=COL30", "AnalSect=COL99");
        let err = build(&src).expect_err("should fail");
        assert!(matches!(err, ModelError::MissingReference { kind: "section", .. }));

        let src = SLAB.replace("SectionName=COL30   Material=C30", "SectionName=COL30   Material=C99");
        let err = build(&src).expect_err("should fail");
        assert!(matches!(err, ModelError::MissingReference { kind: "material", .. }));
    }

    #[test]
    fn model_without_elements_is_unusable() {
        let src = "TABLE: \"JOINT COORDINATES\"\n Joint=1 XorR=0 Y=0 Z=0\n";
        let err = build(src).expect_err("should fail");
        assert!(matches!(err, ModelError::NoElements));
    }

    #[test]
    fn bad_coordinate_reports_cell() {
        let src = TWO_JOINT_FRAME.replace("XorR=1", "XorR=one");
        let err = build(&src).expect_err("should fail");
        match err {
            ModelError::InvalidValue { row, column, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "XorR");
                assert_eq!(value, "one");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
