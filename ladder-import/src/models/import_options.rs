//! Per-batch import options

use ladder_common::config::ImportDefaults;
use ladder_common::{MeshAlgorithm, MeshQuality, SourceUnit};
use std::fmt;
use std::str::FromStr;

/// Where imported objects get their origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OriginMode {
    /// Keep the origin from the file
    #[default]
    None,
    /// Median of the geometry
    Geometry,
    /// Center of the bounding box
    Bounds,
    /// Current 3D cursor location
    Cursor,
    /// World origin
    World,
}

impl FromStr for OriginMode {
    type Err = ladder_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(OriginMode::None),
            "geometry" => Ok(OriginMode::Geometry),
            "bounds" => Ok(OriginMode::Bounds),
            "cursor" => Ok(OriginMode::Cursor),
            "world" => Ok(OriginMode::World),
            other => Err(ladder_common::Error::InvalidInput(format!(
                "unknown origin mode: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for OriginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OriginMode::None => "none",
            OriginMode::Geometry => "geometry",
            OriginMode::Bounds => "bounds",
            OriginMode::Cursor => "cursor",
            OriginMode::World => "world",
        };
        f.write_str(label)
    }
}

/// Everything the user chose for one import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    // Mesh settings
    pub mesh_quality: MeshQuality,
    /// Used only with [`MeshQuality::Custom`]
    pub mesh_size_min: f64,
    /// Used only with [`MeshQuality::Custom`]
    pub mesh_size_max: f64,
    pub algorithm: MeshAlgorithm,
    pub optimize_mesh: bool,
    pub healing: bool,

    // Units / scale
    pub source_unit: SourceUnit,
    pub global_scale: f64,

    // Organization
    pub import_to_collection: bool,
    pub collection_name: Option<String>,
    pub use_part_names: bool,

    // Geometry processing
    pub smooth_shading: bool,
    pub recalc_normals: bool,
    /// Merge vertices within this distance (0 disables)
    pub merge_distance: f64,
    pub apply_transform: bool,
    pub set_origin: OriginMode,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            mesh_quality: MeshQuality::Normal,
            mesh_size_min: 0.1,
            mesh_size_max: 10.0,
            algorithm: MeshAlgorithm::Automatic,
            optimize_mesh: false,
            healing: false,
            source_unit: SourceUnit::Auto,
            global_scale: 1.0,
            import_to_collection: false,
            collection_name: None,
            use_part_names: false,
            smooth_shading: false,
            recalc_normals: false,
            merge_distance: 0.0,
            apply_transform: false,
            set_origin: OriginMode::None,
        }
    }
}

impl ImportOptions {
    /// Start from configured defaults
    pub fn from_defaults(defaults: &ImportDefaults) -> Self {
        Self {
            mesh_quality: defaults.mesh_quality,
            mesh_size_min: defaults.mesh_size_min,
            mesh_size_max: defaults.mesh_size_max,
            global_scale: defaults.global_scale,
            import_to_collection: defaults.import_to_collection,
            smooth_shading: defaults.smooth_shading,
            ..Self::default()
        }
    }
}
