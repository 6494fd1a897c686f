//! # Ladder Common Library
//!
//! Shared vocabulary for the Ladder CAD import tools:
//! - Linear units and the unit scale table
//! - Mesh quality presets and meshing algorithm identifiers
//! - Supported CAD file extensions
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod formats;
pub mod quality;
pub mod units;

pub use error::{Error, Result};
pub use formats::{is_brep_format, is_supported_extension, SUPPORTED_EXTENSIONS};
pub use quality::{MeshAlgorithm, MeshQuality, MeshSizeBounds, MESH_QUALITY_PRESETS};
pub use units::{unit_scale, LinearUnit, SourceUnit, UNIT_SCALES};
