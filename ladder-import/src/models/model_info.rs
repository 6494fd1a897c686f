//! Model introspection snapshot

use ladder_common::LinearUnit;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box across all model entities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub size: [f64; 3],
}

impl BoundingBox {
    /// Build from corners; `size` is derived per axis as `max - min`
    pub fn from_corners(min: [f64; 3], max: [f64; 3]) -> Self {
        Self {
            min,
            max,
            size: [max[0] - min[0], max[1] - min[1], max[2] - min[2]],
        }
    }

    /// Largest extent along any axis
    pub fn max_dimension(&self) -> f64 {
        self.size.iter().copied().fold(f64::MIN, f64::max)
    }
}

/// Introspection result for a CAD file
///
/// `valid == false` implies every count is zero and `bounding_box` is `None`;
/// construct invalid snapshots through [`ModelInfo::invalid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub valid: bool,
    pub points: usize,
    pub curves: usize,
    pub surfaces: usize,
    pub volumes: usize,
    pub bounding_box: Option<BoundingBox>,
    /// `None` when the unit could not be estimated
    pub estimated_unit: Option<LinearUnit>,
    pub part_names: Vec<String>,
}

impl ModelInfo {
    /// The all-zero snapshot returned whenever a model cannot be read
    pub fn invalid() -> Self {
        Self {
            valid: false,
            points: 0,
            curves: 0,
            surfaces: 0,
            volumes: 0,
            bounding_box: None,
            estimated_unit: None,
            part_names: Vec::new(),
        }
    }

    /// Total entity count across all dimensions
    pub fn entities(&self) -> usize {
        self.points + self.curves + self.surfaces + self.volumes
    }

    /// Bucket one entity by topological dimension
    pub(crate) fn count_entity(&mut self, dim: i32) {
        match dim {
            0 => self.points += 1,
            1 => self.curves += 1,
            2 => self.surfaces += 1,
            3 => self.volumes += 1,
            _ => {}
        }
    }
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self::invalid()
    }
}
