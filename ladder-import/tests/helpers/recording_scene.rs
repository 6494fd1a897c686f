//! Scene wrapper that records pipeline calls
//!
//! Delegates to a [`MemoryScene`]. Optionally behaves like hosts whose STL
//! importer also creates a non-mesh helper object.

use ladder_import::scene::{
    CollectionId, ObjectId, ObjectKind, OriginTarget, Scene, SceneResult,
};
use ladder_import::MemoryScene;
use nalgebra::Point3;
use std::path::Path;

#[derive(Debug, Default)]
pub struct RecordingScene {
    pub inner: MemoryScene,
    /// Add an empty next to every imported mesh
    pub add_empty_on_import: bool,

    // Recorded calls
    pub statuses: Vec<Option<String>>,
    pub smoothed: Vec<ObjectId>,
    pub origins: Vec<(ObjectId, OriginTarget)>,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adding_empties() -> Self {
        Self {
            add_empty_on_import: true,
            ..Self::default()
        }
    }
}

impl Scene for RecordingScene {
    fn objects(&self) -> Vec<ObjectId> {
        self.inner.objects()
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.inner.contains(id)
    }

    fn object_kind(&self, id: ObjectId) -> Option<ObjectKind> {
        self.inner.object_kind(id)
    }

    fn object_name(&self, id: ObjectId) -> Option<String> {
        self.inner.object_name(id)
    }

    fn import_stl(&mut self, path: &Path, scale: f64) -> SceneResult<()> {
        self.inner.import_stl(path, scale)?;
        if self.add_empty_on_import {
            self.inner.add_empty("Import Root");
        }
        Ok(())
    }

    fn rename(&mut self, id: ObjectId, name: &str) -> SceneResult<String> {
        self.inner.rename(id, name)
    }

    fn new_collection(&mut self, name: &str) -> CollectionId {
        self.inner.new_collection(name)
    }

    fn remove_collection(&mut self, id: CollectionId) -> SceneResult<()> {
        self.inner.remove_collection(id)
    }

    fn collection_name(&self, id: CollectionId) -> Option<String> {
        self.inner.collection_name(id)
    }

    fn collection_len(&self, id: CollectionId) -> SceneResult<usize> {
        self.inner.collection_len(id)
    }

    fn move_to_collection(&mut self, id: ObjectId, collection: CollectionId) -> SceneResult<()> {
        self.inner.move_to_collection(id, collection)
    }

    fn shade_smooth(&mut self, id: ObjectId) -> SceneResult<()> {
        self.smoothed.push(id);
        self.inner.shade_smooth(id)
    }

    fn merge_by_distance(&mut self, id: ObjectId, threshold: f64) -> SceneResult<usize> {
        self.inner.merge_by_distance(id, threshold)
    }

    fn recalculate_normals(&mut self, id: ObjectId) -> SceneResult<()> {
        self.inner.recalculate_normals(id)
    }

    fn apply_transform(&mut self, id: ObjectId, rotation: bool, scale: bool) -> SceneResult<()> {
        self.inner.apply_transform(id, rotation, scale)
    }

    fn set_origin(&mut self, id: ObjectId, target: OriginTarget) -> SceneResult<()> {
        self.origins.push((id, target));
        self.inner.set_origin(id, target)
    }

    fn cursor_location(&self) -> Point3<f64> {
        self.inner.cursor_location()
    }

    fn set_cursor_location(&mut self, location: Point3<f64>) {
        self.inner.set_cursor_location(location)
    }

    fn select_only(&mut self, ids: &[ObjectId]) {
        self.inner.select_only(ids)
    }

    fn in_camera_view(&self) -> bool {
        self.inner.in_camera_view()
    }

    fn frame_selected(&mut self) {
        self.inner.frame_selected()
    }

    fn set_status_text(&mut self, text: Option<&str>) {
        self.statuses.push(text.map(str::to_string));
        self.inner.set_status_text(text)
    }
}
