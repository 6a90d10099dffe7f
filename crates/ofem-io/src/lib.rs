//! File formats around the structural model.
//!
//! This crate provides:
//! - the **solver deck** writer (`.gldat`) with JSON-persisted deck options
//! - `.ofem` **result archives** (pack / unpack of solver byproducts)
//! - **result readers** for `;`-separated CSV tables and `.pva` files
//! - the **mesh bridge**: model and discrete-mesh export through a
//!   [`GeometryKernel`], with an in-memory kernel that writes Gmsh 2.2 `.msh`
//! - the `.s3dx` **mesh reader**

pub mod archive;
mod deck;
mod error;
mod format;
pub mod kernel;
mod mesh_bridge;
pub mod results;
pub mod s3dx;

pub use archive::{ArchiveMember, MEMBERS, archive_path, compress_job, extract_job, remove_job_files};
pub use deck::{DeckOptions, DeckWriter, LoadCase};
pub use error::{ArchiveError, BridgeError, DeckError, MeshReadError, ResultReadError};
pub use format::{sci, sci_field};
pub use kernel::{GeometryKernel, InMemoryKernel};
pub use mesh_bridge::{EntityGrouping, MeshExport, import_discrete};
pub use results::{PointValue, ResultTable, parse_csv, parse_pva, read_csv, read_pva};
pub use s3dx::{parse_s3dx, read_s3dx};
