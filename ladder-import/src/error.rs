//! Error types for ladder-import
//!
//! Two severities:
//! - [`PipelineError`]: batch-fatal, reported before any file is processed
//! - [`FileFailure`]: one file failed, recorded as a warning, batch continues

use crate::models::ConversionError;
use thiserror::Error;

/// Errors that prevent a batch from starting
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Mesh engine not installed
    #[error("gmsh is not installed. Run `ladder install` first.")]
    BackendUnavailable,

    /// Nothing importable among the given paths
    #[error("No valid CAD files selected")]
    NoFilesResolved,

    /// A batch is already in progress
    #[error("An import is already running")]
    AlreadyRunning,

    /// Option values cannot be used
    #[error("Invalid import options: {0}")]
    InvalidOptions(#[from] ladder_common::Error),
}

/// Per-file failure inside a running batch
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FileFailure {
    /// Could not allocate the intermediate mesh file
    #[error("Failed to create temp file: {0}")]
    TempFile(String),

    /// Load, meshing or export failed in the backend
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Backend reported success but wrote nothing
    #[error("No output produced")]
    MissingOutput,

    /// The scene rejected the intermediate mesh
    #[error("Import failed: {0}")]
    Import(String),

    /// Import succeeded but no new objects appeared
    #[error("Import produced no objects")]
    NoObjectsProduced,
}
