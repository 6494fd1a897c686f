//! CAD → mesh conversion value objects

use ladder_common::{MeshAlgorithm, MeshSizeBounds};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// One conversion attempt for one file
///
/// Immutable once built; the pipeline creates a fresh request per file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    input: PathBuf,
    output: PathBuf,
    mesh_size_min: f64,
    mesh_size_max: f64,
    algorithm: MeshAlgorithm,
    optimize: bool,
    healing: bool,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, bounds: MeshSizeBounds) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            mesh_size_min: bounds.min,
            mesh_size_max: bounds.max,
            algorithm: MeshAlgorithm::FrontalDelaunay,
            optimize: true,
            healing: true,
        }
    }

    pub fn with_algorithm(mut self, algorithm: MeshAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_healing(mut self, healing: bool) -> Self {
        self.healing = healing;
        self
    }

    pub fn input(&self) -> &PathBuf {
        &self.input
    }

    pub fn output(&self) -> &PathBuf {
        &self.output
    }

    pub fn mesh_size_min(&self) -> f64 {
        self.mesh_size_min
    }

    pub fn mesh_size_max(&self) -> f64 {
        self.mesh_size_max
    }

    pub fn algorithm(&self) -> MeshAlgorithm {
        self.algorithm
    }

    pub fn optimize(&self) -> bool {
        self.optimize
    }

    pub fn healing(&self) -> bool {
        self.healing
    }
}

/// Why a conversion failed
///
/// Messages embed the engine's own error text.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum ConversionError {
    /// Engine not installed
    #[error("gmsh is not installed")]
    Unavailable,

    /// File unreadable or rejected by the engine
    #[error("Failed to import CAD file: {0}")]
    Load(String),

    /// Engine could not tessellate the geometry
    #[error("Failed to generate mesh: {0}")]
    MeshGeneration(String),

    /// Mesh generated but could not be written
    #[error("Failed to write STL: {0}")]
    Export(String),

    /// Any other engine failure (session setup, options)
    #[error("Conversion error: {0}")]
    Engine(String),
}

/// Outcome of [`crate::backend::MeshBackend::convert`]
///
/// A failed result never carries part names.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    outcome: Result<Vec<String>, ConversionError>,
}

impl ConversionResult {
    pub fn succeeded(part_names: Vec<String>) -> Self {
        Self {
            outcome: Ok(part_names),
        }
    }

    pub fn failed(error: ConversionError) -> Self {
        Self { outcome: Err(error) }
    }

    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Human-readable outcome
    pub fn message(&self) -> String {
        match &self.outcome {
            Ok(_) => "Conversion successful".to_string(),
            Err(e) => e.to_string(),
        }
    }

    /// Part names discovered in the source file (empty on failure)
    pub fn part_names(&self) -> &[String] {
        match &self.outcome {
            Ok(names) => names,
            Err(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&ConversionError> {
        self.outcome.as_ref().err()
    }

    pub fn into_result(self) -> Result<Vec<String>, ConversionError> {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_has_no_part_names() {
        let result = ConversionResult::failed(ConversionError::Load("bad header".to_string()));
        assert!(!result.success());
        assert!(result.part_names().is_empty());
        assert_eq!(result.message(), "Failed to import CAD file: bad header");
    }

    #[test]
    fn test_success_message() {
        let result = ConversionResult::succeeded(vec!["Bracket".to_string()]);
        assert!(result.success());
        assert_eq!(result.message(), "Conversion successful");
        assert_eq!(result.part_names(), ["Bracket".to_string()]);
    }

    #[test]
    fn test_request_builder() {
        let request = ConversionRequest::new("a.step", "a.stl", MeshSizeBounds { min: 0.5, max: 20.0 })
            .with_algorithm(MeshAlgorithm::Delaunay)
            .with_optimize(false)
            .with_healing(false);

        assert_eq!(request.mesh_size_min(), 0.5);
        assert_eq!(request.mesh_size_max(), 20.0);
        assert_eq!(request.algorithm().id(), 5);
        assert!(!request.optimize());
        assert!(!request.healing());
    }
}
