//! Element-type registry.
//!
//! Fixed table mapping each canonical element shape to its mesh-format type
//! code and to the solver deck parameters `(ntype, nnode, stress location,
//! ngauq, ngaus, ngstq, ngstr)`. Mesh codes are `1..=18` in declaration
//! order, so both directions of the code lookup are O(1).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Topological category of an element, derived from its shape dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementCategory {
    /// 0-D element (spring / isolated vertex)
    Point,
    /// 1-D element (frame, truss)
    Line,
    /// 2-D element (shell, plate)
    Area,
    /// 3-D solid element
    Volume,
}

impl ElementCategory {
    pub fn from_dimension(dim: u8) -> Option<Self> {
        match dim {
            0 => Some(Self::Point),
            1 => Some(Self::Line),
            2 => Some(Self::Area),
            3 => Some(Self::Volume),
            _ => None,
        }
    }

    pub fn dimension(self) -> u8 {
        match self {
            Self::Point => 0,
            Self::Line => 1,
            Self::Area => 2,
            Self::Volume => 3,
        }
    }

    /// Label used for default sections and materials.
    pub fn label(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Line => "curve",
            Self::Area => "area",
            Self::Volume => "volume",
        }
    }
}

impl fmt::Display for ElementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Solver deck parameters of one element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolverParams {
    /// Solver element type (`ntype`)
    pub solver_type: u32,
    /// Nodes per element (`nnode`)
    pub node_count: usize,
    /// Stress location flag
    pub stress_location: u32,
    /// Quadrature rule for stiffness (`ngauq`)
    pub stiffness_quadrature: u32,
    /// Gauss points for stiffness (`ngaus`)
    pub stiffness_gauss_points: u32,
    /// Quadrature rule for stresses (`ngstq`)
    pub stress_quadrature: u32,
    /// Gauss points for stresses (`ngstr`)
    pub stress_gauss_points: u32,
}

const fn params(t: (u32, usize, u32, u32, u32, u32, u32)) -> SolverParams {
    SolverParams {
        solver_type: t.0,
        node_count: t.1,
        stress_location: t.2,
        stiffness_quadrature: t.3,
        stiffness_gauss_points: t.4,
        stress_quadrature: t.5,
        stress_gauss_points: t.6,
    }
}

/// Canonical element shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementShape {
    Line,
    Triangle,
    Quad,
    Tetra,
    Hexahedron,
    Wedge,
    Pyramid,
    Line3,
    Triangle6,
    Quad9,
    Tetra10,
    Hexahedron27,
    Wedge18,
    Pyramid14,
    Vertex,
    Quad8,
    Hexahedron20,
    Triangle10,
}

struct Entry {
    shape: ElementShape,
    name: &'static str,
    dimension: u8,
    params: SolverParams,
}

// Indexed by mesh code - 1.
static REGISTRY: [Entry; 18] = [
    Entry { shape: ElementShape::Line, name: "line", dimension: 1, params: params((7, 2, 1, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Triangle, name: "triangle", dimension: 2, params: params((9, 3, 1, 3, 3, 3, 3)) },
    Entry { shape: ElementShape::Quad, name: "quad", dimension: 2, params: params((9, 4, 1, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Tetra, name: "tetra", dimension: 3, params: params((4, 4, 0, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Hexahedron, name: "hexahedron", dimension: 3, params: params((4, 8, 0, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Wedge, name: "wedge", dimension: 3, params: params((4, 6, 0, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Pyramid, name: "pyramid", dimension: 3, params: params((4, 5, 0, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Line3, name: "line3", dimension: 1, params: params((14, 3, 1, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Triangle6, name: "triangle6", dimension: 2, params: params((9, 6, 1, 3, 3, 3, 3)) },
    Entry { shape: ElementShape::Quad9, name: "quad9", dimension: 2, params: params((9, 9, 1, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Tetra10, name: "tetra10", dimension: 3, params: params((4, 10, 0, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Hexahedron27, name: "hexahedron27", dimension: 3, params: params((4, 27, 0, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Wedge18, name: "wedge18", dimension: 3, params: params((4, 18, 0, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Pyramid14, name: "pyramid14", dimension: 3, params: params((4, 14, 0, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Vertex, name: "vertex", dimension: 0, params: params((0, 1, 0, 0, 0, 0, 0)) },
    Entry { shape: ElementShape::Quad8, name: "quad8", dimension: 2, params: params((9, 8, 1, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Hexahedron20, name: "hexahedron20", dimension: 3, params: params((4, 20, 0, 1, 2, 1, 2)) },
    Entry { shape: ElementShape::Triangle10, name: "triangle10", dimension: 2, params: params((9, 10, 1, 3, 3, 3, 3)) },
];

impl ElementShape {
    pub const ALL: [ElementShape; 18] = [
        Self::Line,
        Self::Triangle,
        Self::Quad,
        Self::Tetra,
        Self::Hexahedron,
        Self::Wedge,
        Self::Pyramid,
        Self::Line3,
        Self::Triangle6,
        Self::Quad9,
        Self::Tetra10,
        Self::Hexahedron27,
        Self::Wedge18,
        Self::Pyramid14,
        Self::Vertex,
        Self::Quad8,
        Self::Hexahedron20,
        Self::Triangle10,
    ];

    fn entry(self) -> &'static Entry {
        &REGISTRY[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    /// Case-insensitive lookup by canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name.trim()))
            .map(|e| e.shape)
    }

    /// Mesh-format (Gmsh) element type code.
    pub fn mesh_code(self) -> i32 {
        self as i32 + 1
    }

    pub fn from_mesh_code(code: i32) -> Option<Self> {
        let index = usize::try_from(code).ok()?.checked_sub(1)?;
        REGISTRY.get(index).map(|e| e.shape)
    }

    pub fn solver_params(self) -> SolverParams {
        self.entry().params
    }

    /// Reverse lookup used when reading solver-side meshes.
    pub fn from_solver(solver_type: u32, node_count: usize) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|e| e.params.solver_type == solver_type && e.params.node_count == node_count)
            .map(|e| e.shape)
    }

    pub fn node_count(self) -> usize {
        self.entry().params.node_count
    }

    pub fn dimension(self) -> u8 {
        self.entry().dimension
    }

    pub fn category(self) -> ElementCategory {
        match self.dimension() {
            0 => ElementCategory::Point,
            1 => ElementCategory::Line,
            2 => ElementCategory::Area,
            _ => ElementCategory::Volume,
        }
    }
}

impl fmt::Display for ElementShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_declaration_order() {
        for (i, shape) in ElementShape::ALL.iter().enumerate() {
            assert_eq!(REGISTRY[i].shape, *shape);
            assert_eq!(shape.mesh_code(), i as i32 + 1);
            assert_eq!(ElementShape::from_mesh_code(shape.mesh_code()), Some(*shape));
            assert_eq!(ElementShape::from_name(shape.name()), Some(*shape));
        }
    }

    #[test]
    fn documented_pairs_are_reproduced() {
        let line = ElementShape::Line.solver_params();
        assert_eq!(line, params((7, 2, 1, 1, 2, 1, 2)));
        assert_eq!(ElementShape::from_name("hexahedron20").map(ElementShape::mesh_code), Some(17));
        assert_eq!(ElementShape::Triangle10.solver_params(), params((9, 10, 1, 3, 3, 3, 3)));
        assert_eq!(ElementShape::Vertex.solver_params(), params((0, 1, 0, 0, 0, 0, 0)));
        assert_eq!(ElementShape::Line3.solver_params().solver_type, 14);
    }

    #[test]
    fn unknown_codes_and_names_are_rejected() {
        assert_eq!(ElementShape::from_mesh_code(0), None);
        assert_eq!(ElementShape::from_mesh_code(19), None);
        assert_eq!(ElementShape::from_mesh_code(-3), None);
        assert_eq!(ElementShape::from_name("hexahedron8"), None);
    }

    #[test]
    fn solver_pairs_are_unique() {
        for shape in ElementShape::ALL {
            let p = shape.solver_params();
            assert_eq!(ElementShape::from_solver(p.solver_type, p.node_count), Some(shape));
        }
        assert_eq!(ElementShape::from_solver(9, 5), None);
    }

    #[test]
    fn dimensions_map_to_categories() {
        assert_eq!(ElementShape::Vertex.category(), ElementCategory::Point);
        assert_eq!(ElementShape::Line3.category(), ElementCategory::Line);
        assert_eq!(ElementShape::Quad8.category(), ElementCategory::Area);
        assert_eq!(ElementShape::Pyramid14.category(), ElementCategory::Volume);
        assert_eq!(ElementCategory::from_dimension(2), Some(ElementCategory::Area));
        assert_eq!(ElementCategory::from_dimension(4), None);
    }
}
