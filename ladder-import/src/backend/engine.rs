//! Mesh engine seam
//!
//! [`MeshEngine`] is the narrow API the backend drives. The engine keeps an
//! implicit "current model", so every use goes through an [`EngineSession`]:
//! opening it initializes the engine and dropping it finalizes it, on every
//! exit path.

use ladder_common::is_brep_format;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use thiserror::Error;

// Engine option keys (exact strings)
pub const GENERAL_TERMINAL: &str = "General.Terminal";
pub const OCC_FIX_DEGENERATED: &str = "Geometry.OCCFixDegenerated";
pub const OCC_FIX_SMALL_EDGES: &str = "Geometry.OCCFixSmallEdges";
pub const OCC_FIX_SMALL_FACES: &str = "Geometry.OCCFixSmallFaces";
pub const OCC_SEW_FACES: &str = "Geometry.OCCSewFaces";
pub const MESH_SIZE_MIN: &str = "Mesh.CharacteristicLengthMin";
pub const MESH_SIZE_MAX: &str = "Mesh.CharacteristicLengthMax";
pub const MESH_ALGORITHM: &str = "Mesh.Algorithm";
pub const MESH_OPTIMIZE: &str = "Mesh.Optimize";
pub const MESH_OPTIMIZE_NETGEN: &str = "Mesh.OptimizeNetgen";

/// Geometry repair flags set before shape import when healing is requested
pub const HEALING_OPTIONS: [&str; 4] = [
    OCC_FIX_DEGENERATED,
    OCC_FIX_SMALL_EDGES,
    OCC_FIX_SMALL_FACES,
    OCC_SEW_FACES,
];

/// A model entity: (topological dimension, tag)
pub type Entity = (i32, i32);

/// Errors reported by a mesh engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine executable or library not found
    #[error("engine not installed: {0}")]
    NotInstalled(String),

    /// Engine could not be started
    #[error("failed to launch engine: {0}")]
    Launch(String),

    /// Engine ran but reported an error
    #[error("{message}")]
    Command { status: Option<i32>, message: String },

    /// Engine output could not be understood
    #[error("unexpected engine output: {0}")]
    Parse(String),

    /// Operation requires an initialized session
    #[error("engine session not initialized")]
    NoSession,

    /// I/O error (script or scratch files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// External meshing engine
pub trait MeshEngine {
    /// Check the engine can be used; returns its version string
    fn query_version(&mut self) -> Result<String, EngineError>;

    fn initialize(&mut self) -> Result<(), EngineError>;

    /// Tear down all engine state. Must be safe to call after a failed initialize.
    fn finalize(&mut self);

    fn add_model(&mut self, name: &str) -> Result<(), EngineError>;

    fn set_number(&mut self, key: &str, value: f64) -> Result<(), EngineError>;

    /// Import boundary-representation shapes (STEP/IGES/BREP)
    fn import_shapes(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Make imported shapes visible to the model
    fn synchronize(&mut self) -> Result<(), EngineError>;

    /// Generic load path for any other format
    fn merge(&mut self, path: &Path) -> Result<(), EngineError>;

    fn entities(&mut self) -> Result<Vec<Entity>, EngineError>;

    /// Model bounding box as `[xmin, ymin, zmin, xmax, ymax, zmax]`
    fn bounding_box(&mut self) -> Result<[f64; 6], EngineError>;

    /// Entity name, empty when unnamed
    fn entity_name(&mut self, dim: i32, tag: i32) -> Result<String, EngineError>;

    fn generate(&mut self, dim: i32) -> Result<(), EngineError>;

    /// Write the current mesh; format follows the output extension
    fn write(&mut self, path: &Path) -> Result<(), EngineError>;
}

/// Scoped engine session: initialized on open, finalized on drop
pub struct EngineSession<'e, E: MeshEngine> {
    engine: &'e mut E,
}

impl<'e, E: MeshEngine> EngineSession<'e, E> {
    /// Initialize the engine, silence its terminal and add a fresh model
    pub fn open(engine: &'e mut E, model: &str) -> Result<Self, EngineError> {
        // Guard exists before initialize so a failed initialize is still finalized
        let mut session = Self { engine };
        session.engine.initialize()?;
        session.engine.set_number(GENERAL_TERMINAL, 0.0)?;
        session.engine.add_model(model)?;
        Ok(session)
    }

    /// Load a file, routing on its suffix
    ///
    /// With `healing`, the repair flags are set before shape import.
    pub fn load(&mut self, path: &Path, healing: bool) -> Result<(), EngineError> {
        if is_brep_format(path) {
            if healing {
                for key in HEALING_OPTIONS {
                    self.engine.set_number(key, 1.0)?;
                }
            }
            self.engine.import_shapes(path)?;
            self.engine.synchronize()
        } else {
            self.engine.merge(path)
        }
    }

    /// Named entities in order of first appearance, deduplicated
    ///
    /// Best-effort: a failing lookup ends collection and keeps what was found.
    pub fn part_names(&mut self, entities: &[Entity]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for &(dim, tag) in entities {
            match self.engine.entity_name(dim, tag) {
                Ok(name) => {
                    if !name.is_empty() && !names.contains(&name) {
                        names.push(name);
                    }
                }
                Err(e) => {
                    tracing::debug!("Part name lookup stopped: {}", e);
                    break;
                }
            }
        }
        names
    }
}

impl<E: MeshEngine> Deref for EngineSession<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        self.engine
    }
}

impl<E: MeshEngine> DerefMut for EngineSession<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        self.engine
    }
}

impl<E: MeshEngine> Drop for EngineSession<'_, E> {
    fn drop(&mut self) {
        self.engine.finalize();
    }
}
