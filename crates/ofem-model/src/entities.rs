//! Model entities: joints, elements, sections, materials, groups and
//! boundary entries.

use serde::{Deserialize, Serialize};

use crate::registry::{ElementCategory, ElementShape};

/// A model node.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// External label as written in the source model
    pub label: String,
    /// Dense 1-based tag in source order
    pub tag: usize,
    pub coords: [f64; 3],
}

/// A structural element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// External label as written in the source model
    pub label: String,
    pub category: ElementCategory,
    /// Mesh-format shape code; resolved through the registry when written
    pub code: i32,
    /// Joint tags in connectivity order
    pub nodes: Vec<usize>,
    /// Dense 1-based tag within its category
    pub tag: usize,
    /// Dense 1-based tag over all elements of the model
    pub deck_tag: usize,
    pub section: String,
    pub groups: Vec<String>,
}

impl Element {
    pub fn shape(&self) -> Option<ElementShape> {
        ElementShape::from_mesh_code(self.code)
    }
}

/// Category-dependent section geometry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SectionGeometry {
    #[default]
    None,
    Frame {
        area: f64,
        torsion: f64,
        inertia2: f64,
        inertia3: f64,
        /// Local axis rotation in degrees
        angle: f64,
    },
    Shell {
        thickness: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub category: ElementCategory,
    pub geometry: SectionGeometry,
    pub material: String,
    /// Dense 1-based index
    pub index: usize,
}

/// Material category. The last three map onto dedicated solver layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialCategory {
    Point,
    Curve,
    Area,
    Volume,
    Interface,
    Soil,
    Spring,
}

/// Record layout of a material set in the solver deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialLayout {
    /// young, poiss, dense, alpha
    Elastic,
    /// subre
    Subgrade,
    /// stift, stifn
    Stiffness,
}

impl MaterialCategory {
    /// Solver element type reserved for this category, if any.
    pub fn solver_type(self) -> Option<u32> {
        match self {
            Self::Soil => Some(10),
            Self::Interface => Some(11),
            Self::Spring => Some(12),
            _ => None,
        }
    }

    pub fn layout(self) -> MaterialLayout {
        match self.solver_type() {
            Some(10) => MaterialLayout::Subgrade,
            Some(11 | 12) => MaterialLayout::Stiffness,
            _ => MaterialLayout::Elastic,
        }
    }

    /// Category of the fallback material for elements of `category`.
    /// Point elements are springs.
    pub fn for_elements(category: ElementCategory) -> Self {
        match category {
            ElementCategory::Point => Self::Spring,
            ElementCategory::Line => Self::Curve,
            ElementCategory::Area => Self::Area,
            ElementCategory::Volume => Self::Volume,
        }
    }
}

/// Physical constants of a material. Unset values are written as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialProps {
    /// Young's modulus
    pub young: Option<f64>,
    pub poisson: Option<f64>,
    /// Weight per unit volume
    pub weight: Option<f64>,
    /// Thermal expansion coefficient
    pub thermal: Option<f64>,
    pub shear: Option<f64>,
    /// Mass per unit volume
    pub mass: Option<f64>,
    pub damping: Option<f64>,
    /// Modulus of subgrade reaction
    pub subgrade: Option<f64>,
    pub stiff_tangential: Option<f64>,
    pub stiff_normal: Option<f64>,
    pub design: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub category: MaterialCategory,
    pub props: MaterialProps,
    /// Dense 1-based index
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub members: Vec<(ElementCategory, String)>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fixity {
    #[default]
    Free,
    Fixed,
}

impl Fixity {
    pub fn code(self) -> u8 {
        match self {
            Fixity::Free => 0,
            Fixity::Fixed => 1,
        }
    }
}

/// A joint with at least one restrained degree of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryEntry {
    pub joint: usize,
    /// Translations x, y, z then rotations x, y, z
    pub dofs: [Fixity; 6],
}

impl BoundaryEntry {
    pub fn fixed(joint: usize) -> Self {
        Self {
            joint,
            dofs: [Fixity::Fixed; 6],
        }
    }

    /// Translations fixed, rotations free.
    pub fn hinged(joint: usize) -> Self {
        let mut dofs = [Fixity::Free; 6];
        dofs[..3].fill(Fixity::Fixed);
        Self { joint, dofs }
    }

    pub fn codes(&self) -> [u8; 6] {
        self.dofs.map(Fixity::code)
    }

    pub fn is_restrained(&self) -> bool {
        self.dofs.contains(&Fixity::Fixed)
    }
}
