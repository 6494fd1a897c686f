//! Mesh quality presets and meshing algorithm identifiers
//!
//! Preset sizes are in source-file units and feed the engine's
//! characteristic-length bounds directly.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mesh density selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeshQuality {
    VeryCoarse,
    Coarse,
    #[default]
    Normal,
    Fine,
    VeryFine,
    /// Bypass the preset table, use user-set bounds
    Custom,
}

/// Quality presets: (quality, size-min, size-max)
pub const MESH_QUALITY_PRESETS: [(MeshQuality, f64, f64); 5] = [
    (MeshQuality::VeryCoarse, 1.0, 50.0),
    (MeshQuality::Coarse, 0.5, 20.0),
    (MeshQuality::Normal, 0.1, 10.0),
    (MeshQuality::Fine, 0.05, 5.0),
    (MeshQuality::VeryFine, 0.01, 1.0),
];

/// Resolved element-size bounds for one batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshSizeBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for MeshSizeBounds {
    fn default() -> Self {
        Self { min: 0.1, max: 10.0 }
    }
}

impl MeshQuality {
    /// Preset bounds, `None` for [`MeshQuality::Custom`]
    pub fn preset_bounds(self) -> Option<MeshSizeBounds> {
        MESH_QUALITY_PRESETS
            .iter()
            .find(|(quality, _, _)| *quality == self)
            .map(|(_, min, max)| MeshSizeBounds { min: *min, max: *max })
    }

    fn label(self) -> &'static str {
        match self {
            MeshQuality::VeryCoarse => "very-coarse",
            MeshQuality::Coarse => "coarse",
            MeshQuality::Normal => "normal",
            MeshQuality::Fine => "fine",
            MeshQuality::VeryFine => "very-fine",
            MeshQuality::Custom => "custom",
        }
    }
}

impl MeshSizeBounds {
    /// Resolve bounds from a preset, or from custom values when `quality` is Custom
    pub fn resolve(quality: MeshQuality, custom_min: f64, custom_max: f64) -> Result<Self> {
        if let Some(bounds) = quality.preset_bounds() {
            return Ok(bounds);
        }

        if !custom_min.is_finite() || custom_min <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "mesh size min must be a positive number (got {})",
                custom_min
            )));
        }
        if !custom_max.is_finite() {
            return Err(Error::InvalidInput(format!(
                "mesh size max must be a finite number (got {})",
                custom_max
            )));
        }
        if custom_max < custom_min {
            return Err(Error::InvalidInput(format!(
                "mesh size max {} is smaller than min {}",
                custom_max, custom_min
            )));
        }

        Ok(Self {
            min: custom_min,
            max: custom_max,
        })
    }
}

impl fmt::Display for MeshQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MeshQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "very-coarse" => Ok(MeshQuality::VeryCoarse),
            "coarse" => Ok(MeshQuality::Coarse),
            "normal" => Ok(MeshQuality::Normal),
            "fine" => Ok(MeshQuality::Fine),
            "very-fine" => Ok(MeshQuality::VeryFine),
            "custom" => Ok(MeshQuality::Custom),
            other => Err(Error::UnknownQuality(other.to_string())),
        }
    }
}

/// 2D meshing algorithm, by engine id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeshAlgorithm {
    MeshAdapt,
    #[default]
    Automatic,
    Delaunay,
    FrontalDelaunay,
    Bamg,
    FrontalDelaunayQuads,
    PackingOfParallelograms,
}

impl MeshAlgorithm {
    pub const ALL: [MeshAlgorithm; 7] = [
        MeshAlgorithm::MeshAdapt,
        MeshAlgorithm::Automatic,
        MeshAlgorithm::Delaunay,
        MeshAlgorithm::FrontalDelaunay,
        MeshAlgorithm::Bamg,
        MeshAlgorithm::FrontalDelaunayQuads,
        MeshAlgorithm::PackingOfParallelograms,
    ];

    /// Engine value for `Mesh.Algorithm`
    pub fn id(self) -> u8 {
        match self {
            MeshAlgorithm::MeshAdapt => 1,
            MeshAlgorithm::Automatic => 2,
            MeshAlgorithm::Delaunay => 5,
            MeshAlgorithm::FrontalDelaunay => 6,
            MeshAlgorithm::Bamg => 7,
            MeshAlgorithm::FrontalDelaunayQuads => 8,
            MeshAlgorithm::PackingOfParallelograms => 9,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|algorithm| algorithm.id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            MeshAlgorithm::MeshAdapt => "mesh-adapt",
            MeshAlgorithm::Automatic => "automatic",
            MeshAlgorithm::Delaunay => "delaunay",
            MeshAlgorithm::FrontalDelaunay => "frontal-delaunay",
            MeshAlgorithm::Bamg => "bamg",
            MeshAlgorithm::FrontalDelaunayQuads => "frontal-delaunay-quads",
            MeshAlgorithm::PackingOfParallelograms => "packing-of-parallelograms",
        }
    }
}

impl fmt::Display for MeshAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MeshAlgorithm {
    type Err = Error;

    /// Accepts an engine id (`"6"`) or a name (`"frontal-delaunay"`)
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(id) = s.parse::<u8>() {
            return Self::from_id(id).ok_or_else(|| Error::UnknownAlgorithm(s.to_string()));
        }
        let wanted = s.to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.label() == wanted)
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_ordered_and_positive() {
        for (quality, min, max) in MESH_QUALITY_PRESETS {
            assert!(min < max, "{quality}: min should be less than max");
            assert!(min > 0.0, "{quality}: min should be positive");
        }
    }

    #[test]
    fn test_custom_has_no_preset() {
        assert!(MeshQuality::Custom.preset_bounds().is_none());
        assert_eq!(
            MeshQuality::Fine.preset_bounds(),
            Some(MeshSizeBounds { min: 0.05, max: 5.0 })
        );
    }

    #[test]
    fn test_resolve_custom_bounds() {
        let bounds = MeshSizeBounds::resolve(MeshQuality::Custom, 0.2, 3.0).unwrap();
        assert_eq!(bounds, MeshSizeBounds { min: 0.2, max: 3.0 });

        // Presets ignore custom values
        let bounds = MeshSizeBounds::resolve(MeshQuality::Coarse, 0.2, 3.0).unwrap();
        assert_eq!(bounds, MeshSizeBounds { min: 0.5, max: 20.0 });

        assert!(MeshSizeBounds::resolve(MeshQuality::Custom, 0.0, 3.0).is_err());
        assert!(MeshSizeBounds::resolve(MeshQuality::Custom, 4.0, 3.0).is_err());
    }

    #[test]
    fn test_resolve_rejects_non_finite_bounds() {
        for (min, max) in [
            (f64::NAN, 3.0),
            (0.2, f64::NAN),
            (f64::INFINITY, f64::INFINITY),
            (0.2, f64::INFINITY),
        ] {
            let result = MeshSizeBounds::resolve(MeshQuality::Custom, min, max);
            assert!(
                matches!(result, Err(Error::InvalidInput(_))),
                "accepted min={} max={}",
                min,
                max
            );
        }
        // Presets never look at the custom values
        assert!(MeshSizeBounds::resolve(MeshQuality::Fine, f64::NAN, f64::NAN).is_ok());
    }

    #[test]
    fn test_quality_parsing() {
        assert_eq!("VERY_FINE".parse::<MeshQuality>().unwrap(), MeshQuality::VeryFine);
        assert_eq!("very-coarse".parse::<MeshQuality>().unwrap(), MeshQuality::VeryCoarse);
        assert!("ultra".parse::<MeshQuality>().is_err());
    }

    #[test]
    fn test_algorithm_ids() {
        let ids: Vec<u8> = MeshAlgorithm::ALL.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec![1, 2, 5, 6, 7, 8, 9]);
        assert_eq!(MeshAlgorithm::default().id(), 2);
        assert_eq!("6".parse::<MeshAlgorithm>().unwrap(), MeshAlgorithm::FrontalDelaunay);
        assert_eq!("bamg".parse::<MeshAlgorithm>().unwrap(), MeshAlgorithm::Bamg);
        assert!("3".parse::<MeshAlgorithm>().is_err());
    }
}
