//! Scene abstraction
//!
//! The pipeline never talks to a concrete 3D application. It drives a
//! [`Scene`]: an ordered set of named objects grouped into collections, with
//! the handful of mesh edits the import post-processing needs.
//! [`MemoryScene`] is the in-process implementation used by the CLI.

pub mod memory;
pub mod mesh_ops;
pub mod obj;
pub mod stl;

pub use memory::MemoryScene;

use nalgebra::Point3;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Stable object handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable collection handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CollectionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Mesh,
    Empty,
    Other,
}

/// Where [`Scene::set_origin`] moves an object's origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginTarget {
    /// Median of the mesh vertices
    GeometryMedian,
    /// Center of the axis-aligned bounds
    BoundsCenter,
    /// Current 3D cursor location
    Cursor,
}

/// Scene errors
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid mesh file: {0}")]
    Parse(String),

    #[error("Unknown object {0}")]
    UnknownObject(ObjectId),

    #[error("Unknown collection {0:?}")]
    UnknownCollection(CollectionId),

    #[error("Object {0} is not a mesh")]
    NotAMesh(ObjectId),
}

pub type SceneResult<T> = std::result::Result<T, SceneError>;

/// Host scene driven by the import pipeline
pub trait Scene {
    /// All objects currently in the scene, in creation order
    fn objects(&self) -> Vec<ObjectId>;

    fn contains(&self, id: ObjectId) -> bool;

    fn object_kind(&self, id: ObjectId) -> Option<ObjectKind>;

    fn object_name(&self, id: ObjectId) -> Option<String>;

    /// Import a surface mesh file, scaling the new objects uniformly
    fn import_stl(&mut self, path: &Path, scale: f64) -> SceneResult<()>;

    /// Rename an object and its mesh data
    ///
    /// Names are unique; a taken name gets a numeric suffix. Returns the
    /// name actually assigned.
    fn rename(&mut self, id: ObjectId, name: &str) -> SceneResult<String>;

    /// Create a collection linked under the scene root
    fn new_collection(&mut self, name: &str) -> CollectionId;

    fn remove_collection(&mut self, id: CollectionId) -> SceneResult<()>;

    fn collection_name(&self, id: CollectionId) -> Option<String>;

    /// Number of objects linked to a collection
    fn collection_len(&self, id: CollectionId) -> SceneResult<usize>;

    /// Unlink the object from every collection and link it to `collection`
    fn move_to_collection(&mut self, id: ObjectId, collection: CollectionId) -> SceneResult<()>;

    fn shade_smooth(&mut self, id: ObjectId) -> SceneResult<()>;

    /// Merge vertices closer than `threshold`; returns the number removed
    fn merge_by_distance(&mut self, id: ObjectId, threshold: f64) -> SceneResult<usize>;

    /// Make face winding consistent and outward-facing
    fn recalculate_normals(&mut self, id: ObjectId) -> SceneResult<()>;

    /// Bake rotation and/or scale into the mesh data
    fn apply_transform(&mut self, id: ObjectId, rotation: bool, scale: bool) -> SceneResult<()>;

    /// Move the origin without moving the geometry in world space
    fn set_origin(&mut self, id: ObjectId, target: OriginTarget) -> SceneResult<()>;

    fn cursor_location(&self) -> Point3<f64>;

    fn set_cursor_location(&mut self, location: Point3<f64>);

    /// Deselect everything, then select the given objects
    fn select_only(&mut self, ids: &[ObjectId]);

    /// Whether the active view looks through a camera
    fn in_camera_view(&self) -> bool;

    /// Fit the view to the selection
    fn frame_selected(&mut self);

    /// Host status line; `None` clears it
    fn set_status_text(&mut self, text: Option<&str>);
}
