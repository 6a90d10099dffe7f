//! Structural model for S2K / mesh / solver-deck translation.
//!
//! This crate provides:
//! - the **element-type registry** (shape, mesh code, solver parameters)
//! - model **entities** (joints, elements, sections, materials, groups, restraints)
//! - [`StructuralModel`] construction from S2K tables or a discretized mesh
//! - JSON-persisted **model defaults** for missing sections and materials

mod build;
pub mod defaults;
pub mod entities;
mod error;
pub mod mesh;
mod model;
pub mod registry;

pub use build::{
    AREA_ASSIGNMENTS, AREA_CONNECTIVITY, AREA_PROPERTIES, FRAME_ASSIGNMENTS, FRAME_CONNECTIVITY,
    FRAME_PROPERTIES, GROUP_ASSIGNMENTS, GROUP_DEFINITIONS, JOINT_COORDINATES, JOINT_RESTRAINTS,
    MATERIAL_GENERAL, MATERIAL_MECHANICAL,
};
pub use defaults::{ModelDefaults, load_defaults, save_defaults};
pub use entities::{
    BoundaryEntry, Element, Fixity, Group, Joint, Material, MaterialCategory, MaterialLayout,
    MaterialProps, Section, SectionGeometry,
};
pub use error::{ConfigError, ModelError, Result};
pub use mesh::{DiscreteMesh, MeshCell, MeshNode};
pub use model::StructuralModel;
pub use registry::{ElementCategory, ElementShape, SolverParams};
