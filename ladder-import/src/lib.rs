//! ladder-import: batch CAD → mesh import
//!
//! Converts STEP/IGES/BREP files to surface meshes through an external
//! meshing engine and imports the results into a host scene, one file per
//! pipeline step.

pub mod backend;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod scene;
pub mod services;

pub use crate::backend::{GmshCli, InstallOutcome, MeshBackend, MeshEngine};
pub use crate::error::{FileFailure, PipelineError};
pub use crate::pipeline::{ImportPipeline, PipelineState, StepOutcome};
pub use crate::scene::{MemoryScene, Scene};
