//! Default section and material properties, used when a model does not
//! define its own. Persisted as JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entities::{MaterialCategory, MaterialProps, SectionGeometry};
use crate::error::ConfigError;
use crate::registry::ElementCategory;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionDefaults {
    pub material: String,
    pub area: Option<f64>,
    pub torsion: Option<f64>,
    pub inertia2: Option<f64>,
    pub inertia3: Option<f64>,
    pub angle: Option<f64>,
    pub thickness: Option<f64>,
}

impl SectionDefaults {
    fn frame(area: f64, torsion: f64, inertia2: f64, inertia3: f64, material: &str) -> Self {
        Self {
            material: material.to_string(),
            area: Some(area),
            torsion: Some(torsion),
            inertia2: Some(inertia2),
            inertia3: Some(inertia3),
            angle: Some(0.0),
            ..Self::default()
        }
    }

    fn material_only(material: &str) -> Self {
        Self {
            material: material.to_string(),
            ..Self::default()
        }
    }

    pub fn geometry(&self, category: ElementCategory) -> SectionGeometry {
        match category {
            ElementCategory::Line => SectionGeometry::Frame {
                area: self.area.unwrap_or(0.0),
                torsion: self.torsion.unwrap_or(0.0),
                inertia2: self.inertia2.unwrap_or(0.0),
                inertia3: self.inertia3.unwrap_or(0.0),
                angle: self.angle.unwrap_or(0.0),
            },
            ElementCategory::Area => SectionGeometry::Shell {
                thickness: self.thickness.unwrap_or(0.0),
            },
            ElementCategory::Point | ElementCategory::Volume => SectionGeometry::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionDefaultSet {
    pub point: SectionDefaults,
    pub curve: SectionDefaults,
    pub area: SectionDefaults,
    pub volume: SectionDefaults,
}

impl Default for SectionDefaultSet {
    fn default() -> Self {
        Self {
            point: SectionDefaults::material_only("spring"),
            curve: SectionDefaults::frame(0.001, 0.00001, 0.0001, 0.00001, "steel"),
            area: SectionDefaults {
                thickness: Some(0.25),
                ..SectionDefaults::material_only("concrete")
            },
            volume: SectionDefaults::material_only("concrete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDefaultSet {
    pub point: MaterialProps,
    pub curve: MaterialProps,
    pub area: MaterialProps,
    pub volume: MaterialProps,
    pub interface: MaterialProps,
    pub soil: MaterialProps,
    pub spring: MaterialProps,
}

fn elastic(young: f64, weight: f64) -> MaterialProps {
    MaterialProps {
        young: Some(young),
        poisson: Some(0.2),
        weight: Some(weight),
        thermal: Some(1.0e-6),
        ..MaterialProps::default()
    }
}

fn structural(young: f64, weight: f64, mass: f64, damping: f64, design: &str) -> MaterialProps {
    MaterialProps {
        shear: Some(8.0e6),
        mass: Some(mass),
        damping: Some(damping),
        design: Some(design.to_string()),
        ..elastic(young, weight)
    }
}

fn stiffness(tangential: f64, normal: f64) -> MaterialProps {
    MaterialProps {
        stiff_tangential: Some(tangential),
        stiff_normal: Some(normal),
        ..MaterialProps::default()
    }
}

impl Default for MaterialDefaultSet {
    fn default() -> Self {
        Self {
            point: elastic(2.0e8, 77.0),
            curve: structural(2.0e8, 77.0, 7850.0, 0.02, "steel"),
            area: structural(3.0e7, 25.0, 2500.0, 0.05, "concrete"),
            volume: structural(3.0e7, 25.0, 2500.0, 0.05, "concrete"),
            interface: stiffness(1.0e6, 1.0e10),
            soil: MaterialProps {
                subgrade: Some(1.0e6),
                ..MaterialProps::default()
            },
            spring: stiffness(1.0e6, 1.0),
        }
    }
}

/// Fallback properties applied by the model builder.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDefaults {
    pub sections: SectionDefaultSet,
    pub materials: MaterialDefaultSet,
}

impl ModelDefaults {
    pub fn section(&self, category: ElementCategory) -> &SectionDefaults {
        match category {
            ElementCategory::Point => &self.sections.point,
            ElementCategory::Line => &self.sections.curve,
            ElementCategory::Area => &self.sections.area,
            ElementCategory::Volume => &self.sections.volume,
        }
    }

    pub fn material(&self, category: MaterialCategory) -> &MaterialProps {
        match category {
            MaterialCategory::Point => &self.materials.point,
            MaterialCategory::Curve => &self.materials.curve,
            MaterialCategory::Area => &self.materials.area,
            MaterialCategory::Volume => &self.materials.volume,
            MaterialCategory::Interface => &self.materials.interface,
            MaterialCategory::Soil => &self.materials.soil,
            MaterialCategory::Spring => &self.materials.spring,
        }
    }

    /// Name given to the fallback section of `category`.
    pub fn section_name(category: ElementCategory) -> String {
        format!("DEFAULT_{}", category.label().to_ascii_uppercase())
    }
}

pub fn save_defaults(path: impl AsRef<Path>, defaults: &ModelDefaults) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let bytes = serde_json::to_vec_pretty(defaults)?;
    fs::write(path, bytes).map_err(io_err)
}

pub fn load_defaults(path: impl AsRef<Path>) -> Result<ModelDefaults, ConfigError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}
