//! Writer for the femix/ofem `.gldat` solver input deck.
//!
//! The deck is a fixed-column text file: main parameters, element parameter
//! sets, material sets, element nodal properties, connectivity, coordinates,
//! fixed points and a single gravity load case. Everything is rendered into
//! memory first, so a failed conversion never leaves a partial file behind.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

use ofem_model::{
    ConfigError, Element, ElementShape, Material, MaterialLayout, Section, SectionGeometry,
    StructuralModel,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DeckError;
use crate::format::sci_field;

const SEPARATOR: &str =
    "# ===================================================================";

/// The single load case emitted in every deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadCase {
    pub title: String,
    /// Gravity acceleration in global axes
    pub gravity: [f64; 3],
}

impl Default for LoadCase {
    fn default() -> Self {
        Self {
            title: "First load case title (gravity)".to_string(),
            gravity: [0.0, 0.0, -9.81],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckOptions {
    pub title: String,
    /// Geometric dimensions written as `nmdim`; 2 drops the z coordinate
    pub dimensions: u32,
    pub load_case: LoadCase,
}

impl Default for DeckOptions {
    fn default() -> Self {
        Self {
            title: "Main title - Units (F,L)".to_string(),
            dimensions: 3,
            load_case: LoadCase::default(),
        }
    }
}

impl DeckOptions {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let bytes = serde_json::to_vec_pretty(self)?;
        fs::write(path, bytes).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// One element parameter set: a distinct (section, shape) pair.
struct ParameterSet<'a> {
    section: &'a Section,
    shape: ElementShape,
}

struct ElementRow<'a> {
    element: &'a Element,
    /// 1-based parameter set, also used as the nodal property set
    set: usize,
    /// 1-based index into the used materials
    material: usize,
}

/// Resolved numbering for one deck.
struct Plan<'a> {
    sets: Vec<ParameterSet<'a>>,
    materials: Vec<&'a Material>,
    rows: Vec<ElementRow<'a>>,
}

/// Solver deck writer for a [`StructuralModel`].
pub struct DeckWriter<'a> {
    model: &'a StructuralModel,
    options: DeckOptions,
}

impl<'a> DeckWriter<'a> {
    pub fn new(model: &'a StructuralModel, options: DeckOptions) -> Self {
        Self { model, options }
    }

    pub fn options(&self) -> &DeckOptions {
        &self.options
    }

    /// Render the complete deck.
    pub fn render(&self) -> Result<String, DeckError> {
        let plan = self.plan()?;
        debug!(
            sets = plan.sets.len(),
            materials = plan.materials.len(),
            elements = plan.rows.len(),
            "deck numbering resolved"
        );
        let mut out = String::new();
        self.write_all(&plan, &mut out)?;
        Ok(out)
    }

    /// Render and write the deck to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), DeckError> {
        let path = path.as_ref();
        let deck = self.render()?;
        fs::write(path, deck).map_err(|source| DeckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "solver deck written");
        Ok(())
    }

    fn plan(&self) -> Result<Plan<'a>, DeckError> {
        let model = self.model;
        let mut plan = Plan {
            sets: Vec::new(),
            materials: Vec::new(),
            rows: Vec::with_capacity(model.element_count()),
        };

        for element in model.elements() {
            let (shape, section, material) = resolve(model, element)?;

            let set = match plan
                .sets
                .iter()
                .position(|s| s.section.name == section.name && s.shape == shape)
            {
                Some(i) => i + 1,
                None => {
                    plan.sets.push(ParameterSet { section, shape });
                    plan.sets.len()
                }
            };
            let material = match plan.materials.iter().position(|m| m.name == material.name) {
                Some(i) => i + 1,
                None => {
                    plan.materials.push(material);
                    plan.materials.len()
                }
            };
            plan.rows.push(ElementRow {
                element,
                set,
                material,
            });
        }
        Ok(plan)
    }

    fn write_all(&self, plan: &Plan<'_>, out: &mut String) -> fmt::Result {
        self.write_main_parameters(plan, out)?;
        write_parameter_sets(plan, out)?;
        write_materials(plan, out)?;
        write_nodal_properties(plan, out)?;
        write_elements(plan, out)?;
        self.write_coordinates(out)?;
        self.write_fixed_points(out)?;
        write_unused_blocks(out)?;
        self.write_load_case(out)
    }

    fn write_main_parameters(&self, plan: &Plan<'_>, out: &mut String) -> fmt::Result {
        let model = self.model;
        writeln!(out, "### Main title of the problem")?;
        writeln!(out, "{}", self.options.title)?;
        writeln!(out)?;
        writeln!(out, "### Main parameters")?;
        let counts = [
            (plan.rows.len(), "nelem (n. of elements in the mesh)"),
            (model.joint_count(), "npoin (n. of points in the mesh)"),
            (
                model.boundaries().len(),
                "nvfix (n. of points with fixed degrees of freedom)",
            ),
            (1, "ncase (n. of load cases)"),
            (plan.sets.len(), "nselp (n. of sets of element parameters)"),
            (plan.materials.len(), "nmats (n. of sets of material properties)"),
            (plan.sets.len(), "nspen (n. of sets of element nodal properties)"),
            (
                self.options.dimensions as usize,
                "nmdim (n. of geometric dimensions)",
            ),
            (0, "nnscs (n. of nodes with specified coordinate systems)"),
            (0, "nsscs (n. of sets of specified coordinate systems)"),
            (0, "nncod (n. of nodes with constrained d.o.f.)"),
            (0, "nnecc (n. of nodes with eccentric connections)"),
        ];
        for (value, label) in counts {
            writeln!(out, "{value:5} # {label}")?;
        }
        Ok(())
    }

    fn write_coordinates(&self, out: &mut String) -> fmt::Result {
        let planar = self.options.dimensions == 2;
        writeln!(out)?;
        writeln!(out, "### Coordinates of the points")?;
        if planar {
            writeln!(out, "# ipoin            coord-x            coord-y")?;
        } else {
            writeln!(
                out,
                "# ipoin            coord-x            coord-y            coord-z"
            )?;
        }
        for joint in self.model.joints() {
            let [x, y, z] = joint.coords;
            if planar {
                writeln!(out, " {:6}    {x:16.8}   {y:16.8}", joint.tag)?;
            } else {
                writeln!(out, " {:6}    {x:16.8}   {y:16.8}   {z:16.8}", joint.tag)?;
            }
        }
        Ok(())
    }

    fn write_fixed_points(&self, out: &mut String) -> fmt::Result {
        writeln!(out)?;
        writeln!(
            out,
            "### Points with fixed degrees of freedom and fixity codes (1-fixed0-free)"
        )?;
        writeln!(out, "# ivfix  nofix       ifpre ...")?;
        for (i, entry) in self.model.boundaries().iter().enumerate() {
            let codes = entry
                .codes()
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(out, " {:6} {:6}          {codes}", i + 1, entry.joint)?;
        }
        Ok(())
    }

    fn write_load_case(&self, out: &mut String) -> fmt::Result {
        let load = &self.options.load_case;
        writeln!(out)?;
        writeln!(out, "{SEPARATOR}")?;
        writeln!(out)?;
        writeln!(out, "### Load case n. {:8}", 1)?;
        writeln!(out)?;
        writeln!(out, "### Title of the load case")?;
        writeln!(out, "{}", load.title)?;
        writeln!(out)?;
        writeln!(out, "### Load parameters")?;
        let flags = [
            (0, "nplod (n. of point loads in nodal points)"),
            (1, "ngrav (gravity load flag: 1-yes0-no)"),
            (0, "nedge (n. of edge loads) (F.E.M. only)"),
            (0, "nface (n. of face loads) (F.E.M. only)"),
            (0, "ntemp (n. of points with temperature variation) (F.E.M. only)"),
            (0, "nudis (n. of uniformly distributed loads (3d frames and trusses only)"),
            (0, "nepoi (n. of element point loads) (3d frames and trusses only)"),
            (0, "nprva (n. of prescribed and non zero degrees of freedom)"),
        ];
        for (value, label) in flags {
            writeln!(out, "{value:5} # {label}")?;
        }
        out.push_str(POINT_LOAD_HEADER);
        out.push_str(GRAVITY_HEADER);
        let [gx, gy, gz] = load.gravity;
        writeln!(
            out,
            "    {}{}{}",
            sci_field(gx, 16, 8),
            sci_field(gy, 16, 8),
            sci_field(gz, 16, 8)
        )?;
        out.push_str(TRAILING_LOAD_HEADERS);
        writeln!(out)?;
        writeln!(out, "END_OF_FILE")
    }
}

fn write_parameter_sets(plan: &Plan<'_>, out: &mut String) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "### Sets of element parameters")?;
    for (i, set) in plan.sets.iter().enumerate() {
        let p = set.shape.solver_params();
        writeln!(out, "# iselp")?;
        writeln!(out, " {:6}", i + 1)?;
        writeln!(out, "# element parameters")?;
        writeln!(out, "{:5} # ntype (n. of element type)", p.solver_type)?;
        writeln!(out, "{:5} # nnode (n. of nodes per element)", p.node_count)?;
        writeln!(
            out,
            "{:5} # ngauq (n. of Gaussian quadrature) (stiffness)",
            p.stiffness_quadrature
        )?;
        writeln!(
            out,
            "{:5} # ngaus (n. of Gauss points in the formulation) (stiffness)",
            p.stiffness_gauss_points
        )?;
        writeln!(
            out,
            "{:5} # ngstq (n. of Gaussian quadrature) (stresses)",
            p.stress_quadrature
        )?;
        writeln!(
            out,
            "{:5} # ngstr (n. of Gauss points in the formulation) (stresses)",
            p.stress_gauss_points
        )?;
    }
    Ok(())
}

fn write_materials(plan: &Plan<'_>, out: &mut String) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "### Sets of material properties")?;
    writeln!(
        out,
        "### (Young modulus, Poisson ratio, mass/volume and thermic coeff."
    )?;
    writeln!(out, "###  Modulus of subgrade reaction, normal and shear stifness)")?;
    for (i, material) in plan.materials.iter().enumerate() {
        let props = &material.props;
        let values = match material.category.layout() {
            MaterialLayout::Subgrade => {
                writeln!(out, "# imats         subre")?;
                vec![props.subgrade]
            }
            MaterialLayout::Stiffness => {
                writeln!(out, "# imats         stift        stifn")?;
                vec![props.stiff_tangential, props.stiff_normal]
            }
            MaterialLayout::Elastic => {
                writeln!(out, "# imats         young        poiss        dense        alpha")?;
                vec![props.young, props.poisson, props.mass, props.thermal]
            }
        };
        write!(out, "  {:5}", i + 1)?;
        for value in values {
            out.push_str(&sci_field(value.unwrap_or(0.0), 15, 6));
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Per-node values of a nodal property set, chosen by solver element type.
fn nodal_layout(shape: ElementShape, geometry: SectionGeometry) -> (&'static str, Vec<f64>) {
    let (thickness, frame) = match geometry {
        SectionGeometry::Shell { thickness } => (thickness, [0.0; 5]),
        SectionGeometry::Frame {
            area,
            torsion,
            inertia2,
            inertia3,
            angle,
        } => (0.0, [area, torsion, inertia2, inertia3, angle]),
        SectionGeometry::None => (0.0, [0.0; 5]),
    };
    let [area, torsion, inertia2, inertia3, angle] = frame;
    match shape.solver_params().solver_type {
        1 | 5 | 6 | 9 | 11 | 12 => ("# inode       thick", vec![thickness]),
        7 => (
            "# inode       barea        binet        bin2l        bin3l        bangl(deg)",
            vec![area, torsion, inertia2, inertia3, angle],
        ),
        13 | 14 => ("# inode       barea        biner", vec![area, inertia3]),
        15 => (
            "# inode        barea        binet        bin2l        bin3l        eccen(deg)",
            vec![area, torsion, inertia2, inertia3, 0.0],
        ),
        8 | 16 => ("# inode        barea", vec![area]),
        _ => ("", Vec::new()),
    }
}

fn write_nodal_properties(plan: &Plan<'_>, out: &mut String) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "### Sets of element nodal properties")?;
    for (i, set) in plan.sets.iter().enumerate() {
        writeln!(out, "# ispen")?;
        writeln!(out, " {:6}", i + 1)?;
        let (header, values) = nodal_layout(set.shape, set.section.geometry);
        if values.is_empty() {
            continue;
        }
        writeln!(out, "{header}")?;
        for inode in 1..=set.shape.node_count() {
            write!(out, " {inode:6}")?;
            for value in &values {
                out.push_str(&sci_field(*value, 15, 6));
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_elements(plan: &Plan<'_>, out: &mut String) -> fmt::Result {
    writeln!(out)?;
    writeln!(
        out,
        "### Element parameter index, material properties index, element nodal"
    )?;
    writeln!(out, "### properties index and list of the nodes of each element")?;
    writeln!(out, "# ielem ielps matno ielnp       lnods ...")?;
    for row in &plan.rows {
        write!(
            out,
            " {:6} {:5} {:5}  {:5}    ",
            row.element.deck_tag, row.set, row.material, row.set
        )?;
        for node in &row.element.nodes {
            write!(out, " {node:8}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_unused_blocks(out: &mut String) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "### Sets of specified coordinate systems")?;
    writeln!(out, "# isscs")?;
    writeln!(out, "# ivect    vect1    vect2    vect3")?;
    writeln!(out)?;
    writeln!(out, "### Nodes with specified coordinate systems")?;
    writeln!(out, "# inscs inosp itycs")?;
    writeln!(out)?;
    writeln!(out, "### Nodes with linear constraints")?;
    writeln!(out, "# incod")?;
    writeln!(out, "# csnod csdof nmnod")?;
    writeln!(out, "# imnod cmnod cmdof  wedof")?;
    writeln!(out)?;
    writeln!(out, "### Nodes with eccentric connections")?;
    writeln!(out, "# inecc  esnod   emnod    eccen...")
}

const POINT_LOAD_HEADER: &str = "
### Point loads in nodal points (loaded point and load value)
### (global coordinate system)
### ntype =          1,2,3
# iplod  lopop    pload-x  pload-y
### ntype =            4,8
# iplod  lopop    pload-x  pload-y  pload-z
### ntype =              5
# iplod  lopop    pload-z pload-tx pload-ty
### ntype =      4,6,7,8,9
# iplod  lopop    pload-x  pload-y  pload-z pload-tx pload-ty pload-tz
### ntype =          13,14
# iplod  lopop    pload-x  pload-y pload-tz
";

const GRAVITY_HEADER: &str = "
### Gravity load (gravity acceleration)
### (global coordinate system)
### ntype = 1,2,3,13,14,16
#      gravi-x      gravi-y
### ntype =              5
#      gravi-z
### ntype =   4,6,7,8,9,15
#      gravi-x      gravi-y      gravi-z
";

const TRAILING_LOAD_HEADERS: &str = "
### Edge load (loaded element, loaded points and load value)
### (local coordinate system)
# iedge  loele
### ntype = 1,2,3,13,14
# lopoe       press-t   press-n
### ntype =           4
# lopoe       press-t   press-nt   press-nn
# lopon ...
### ntype =           5
# lopoe       press-n   press-mb   press-mt
### ntype =         6,9
# lopoe       press-t   press-nt   press-nn   press-mb   press-mt

### Face load (loaded element, loaded points and load value)
### (local coordinate system)
# iface  loelf
### ntype = 1,2,3
# lopof      prfac-s1   prfac-s2
### ntype =     4
# lopof      prfac-s1   prfac-s2    prfac-n
### ntype =     5
# lopof       prfac-n   prfac-mb   prfac-mt
### ntype =   6,9
# lopof      prfac-s1   prfac-s2    prfac-n  prfac-ms2  prfac-ms1

### Uniformly distributed load in 3d frame or truss elements (loaded element
### and load value) (local coordinate system)
### ntype =     7
# iudis  loelu    udisl-x    udisl-y    udisl-z   udisl-tx   udisl-ty   udisl-tz
### ntype =     8
# iudis  loelu    udisl-x    udisl-y    udisl-z

### Element point load in 3d frame or truss elements (loaded element, distance
### to the left end and load value) (global coordinate system)
### ntype =     7
# iepoi loelp   xepoi   epoil-x  epoil-y  epoil-z epoil-tx epoil-ty epoil-tz
### ntype =     8
# iepoi loelp   xepoi   epoil-x  epoil-y  epoil-z

### Thermal load (loaded point and temperature variation)
# itemp  lopot     tempn

### Prescribed variables (point, degree of freedom and prescribed value)
### (global coordinate system)
# iprva  nnodp  ndofp    prval
";

/// Shape, section and material of `element`. Models built by
/// `StructuralModel::from_tables` or `from_mesh` are already validated, so
/// these lookups only fail for elements detached from their model.
fn resolve<'m>(
    model: &'m StructuralModel,
    element: &Element,
) -> Result<(ElementShape, &'m Section, &'m Material), DeckError> {
    let shape = element
        .shape()
        .ok_or_else(|| DeckError::UnsupportedElementType {
            element: element.label.clone(),
            code: element.code,
        })?;
    let section = model
        .section(&element.section)
        .ok_or_else(|| DeckError::MissingReference {
            kind: "section",
            label: element.section.clone(),
            owner: format!("element {}", element.label),
        })?;
    let material = model
        .material(&section.material)
        .ok_or_else(|| DeckError::MissingReference {
            kind: "material",
            label: section.material.clone(),
            owner: format!("section {}", section.name),
        })?;
    Ok((shape, section, material))
}
