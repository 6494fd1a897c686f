//! In-memory scene

use super::mesh_ops::TriMesh;
use super::stl::read_stl;
use super::{CollectionId, ObjectId, ObjectKind, OriginTarget, Scene, SceneError, SceneResult};
use nalgebra::{Matrix3, Point3, Vector3};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Object stored in a [`MemoryScene`]
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    /// Name of the mesh datablock (meaningful for meshes only)
    pub data_name: String,
    pub kind: ObjectKind,
    pub mesh: Option<TriMesh>,
    pub location: Point3<f64>,
    pub rotation: Matrix3<f64>,
    pub scale: Vector3<f64>,
    pub smooth: bool,
    pub selected: bool,
}

impl SceneObject {
    /// Linear part of the object's transform
    pub fn basis(&self) -> Matrix3<f64> {
        self.rotation * Matrix3::from_diagonal(&self.scale)
    }

    /// Mesh vertices in world space
    pub fn world_vertices(&self) -> Vec<Point3<f64>> {
        let basis = self.basis();
        self.mesh
            .iter()
            .flat_map(|m| m.vertices.iter())
            .map(|v| self.location + basis * v.coords)
            .collect()
    }
}

#[derive(Debug, Clone)]
struct Collection {
    name: String,
    objects: Vec<ObjectId>,
}

/// Scene kept entirely in memory
///
/// Object ids increase monotonically, so iteration order is creation order.
/// Objects not linked to any collection live in the scene root.
#[derive(Debug, Default)]
pub struct MemoryScene {
    objects: BTreeMap<ObjectId, SceneObject>,
    collections: BTreeMap<CollectionId, Collection>,
    next_id: u64,
    cursor: Point3<f64>,
    camera_view: bool,
    status: Option<String>,
    frame_requests: usize,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Add a mesh object to the scene root
    pub fn add_mesh(&mut self, name: &str, mesh: TriMesh) -> ObjectId {
        self.add_object(name, ObjectKind::Mesh, Some(mesh))
    }

    /// Add a non-mesh object (e.g. an empty) to the scene root
    pub fn add_empty(&mut self, name: &str) -> ObjectId {
        self.add_object(name, ObjectKind::Empty, None)
    }

    fn add_object(&mut self, name: &str, kind: ObjectKind, mesh: Option<TriMesh>) -> ObjectId {
        let id = ObjectId(self.allocate_id());
        let object_name = self.unique_object_name(name, None);
        let data_name = self.unique_data_name(name, None);
        self.objects.insert(
            id,
            SceneObject {
                name: object_name,
                data_name,
                kind,
                mesh,
                location: Point3::origin(),
                rotation: Matrix3::identity(),
                scale: Vector3::repeat(1.0),
                smooth: false,
                selected: false,
            },
        );
        id
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    /// Remove an object and unlink it everywhere
    pub fn remove_object(&mut self, id: ObjectId) -> SceneResult<()> {
        self.objects.remove(&id).ok_or(SceneError::UnknownObject(id))?;
        for collection in self.collections.values_mut() {
            collection.objects.retain(|o| *o != id);
        }
        Ok(())
    }

    pub fn collections(&self) -> Vec<CollectionId> {
        self.collections.keys().copied().collect()
    }

    /// Collection holding the object, `None` for the scene root
    pub fn object_collection(&self, id: ObjectId) -> Option<CollectionId> {
        self.collections
            .iter()
            .find(|(_, c)| c.objects.contains(&id))
            .map(|(cid, _)| *cid)
    }

    pub fn selected(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, o)| o.selected)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn set_camera_view(&mut self, camera_view: bool) {
        self.camera_view = camera_view;
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Number of times the view was framed
    pub fn frame_requests(&self) -> usize {
        self.frame_requests
    }

    /// Write every mesh object to a Wavefront OBJ file
    pub fn export_obj(&self, path: &Path) -> SceneResult<()> {
        std::fs::write(path, super::obj::to_obj(self))?;
        Ok(())
    }

    /// Objects with their collection name, in creation order
    pub(crate) fn objects_with_collections(&self) -> Vec<(&SceneObject, Option<&str>)> {
        self.objects
            .iter()
            .map(|(id, object)| {
                let collection = self
                    .object_collection(*id)
                    .and_then(|cid| self.collections.get(&cid))
                    .map(|c| c.name.as_str());
                (object, collection)
            })
            .collect()
    }

    fn unique_object_name(&self, base: &str, exclude: Option<ObjectId>) -> String {
        unique_name(base, |candidate| {
            self.objects
                .iter()
                .any(|(id, o)| Some(*id) != exclude && o.name == candidate)
        })
    }

    fn unique_data_name(&self, base: &str, exclude: Option<ObjectId>) -> String {
        unique_name(base, |candidate| {
            self.objects
                .iter()
                .any(|(id, o)| Some(*id) != exclude && o.mesh.is_some() && o.data_name == candidate)
        })
    }

    fn get(&self, id: ObjectId) -> SceneResult<&SceneObject> {
        self.objects.get(&id).ok_or(SceneError::UnknownObject(id))
    }

    fn get_mut(&mut self, id: ObjectId) -> SceneResult<&mut SceneObject> {
        self.objects.get_mut(&id).ok_or(SceneError::UnknownObject(id))
    }

    fn mesh_object_mut(&mut self, id: ObjectId) -> SceneResult<(&mut SceneObject, TriMesh)> {
        let object = self.get_mut(id)?;
        let mesh = object.mesh.take().ok_or(SceneError::NotAMesh(id))?;
        Ok((object, mesh))
    }
}

/// `base`, or `base.001`, `base.002`, ... until one is free
fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}.{:03}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

impl Scene for MemoryScene {
    fn objects(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    fn object_kind(&self, id: ObjectId) -> Option<ObjectKind> {
        self.objects.get(&id).map(|o| o.kind)
    }

    fn object_name(&self, id: ObjectId) -> Option<String> {
        self.objects.get(&id).map(|o| o.name.clone())
    }

    fn import_stl(&mut self, path: &Path, scale: f64) -> SceneResult<()> {
        let solids = read_stl(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Mesh".to_string());

        for object in self.objects.values_mut() {
            object.selected = false;
        }

        let mut created = 0;
        for solid in solids.into_iter().filter(|s| !s.mesh.is_empty()) {
            let name = if solid.name.trim().is_empty() {
                stem.clone()
            } else {
                solid.name.trim().to_string()
            };
            let id = self.add_mesh(&name, solid.mesh);
            let object = self.get_mut(id)?;
            object.scale = Vector3::repeat(scale);
            object.selected = true;
            created += 1;
        }

        debug!("Imported {} object(s) from {}", created, path.display());
        Ok(())
    }

    fn rename(&mut self, id: ObjectId, name: &str) -> SceneResult<String> {
        self.get(id)?;
        let object_name = self.unique_object_name(name, Some(id));
        let data_name = self.unique_data_name(name, Some(id));
        let object = self.get_mut(id)?;
        object.name = object_name.clone();
        if object.mesh.is_some() {
            object.data_name = data_name;
        }
        Ok(object_name)
    }

    fn new_collection(&mut self, name: &str) -> CollectionId {
        let name = unique_name(name, |candidate| {
            self.collections.values().any(|c| c.name == candidate)
        });
        let id = CollectionId(self.allocate_id());
        self.collections.insert(
            id,
            Collection {
                name,
                objects: Vec::new(),
            },
        );
        id
    }

    fn remove_collection(&mut self, id: CollectionId) -> SceneResult<()> {
        let collection = self
            .collections
            .remove(&id)
            .ok_or(SceneError::UnknownCollection(id))?;
        // Orphaned objects fall back to the scene root
        debug!(
            "Removed collection {} ({} object(s) moved to root)",
            collection.name,
            collection.objects.len()
        );
        Ok(())
    }

    fn collection_name(&self, id: CollectionId) -> Option<String> {
        self.collections.get(&id).map(|c| c.name.clone())
    }

    fn collection_len(&self, id: CollectionId) -> SceneResult<usize> {
        self.collections
            .get(&id)
            .map(|c| c.objects.len())
            .ok_or(SceneError::UnknownCollection(id))
    }

    fn move_to_collection(&mut self, id: ObjectId, collection: CollectionId) -> SceneResult<()> {
        self.get(id)?;
        if !self.collections.contains_key(&collection) {
            return Err(SceneError::UnknownCollection(collection));
        }
        for c in self.collections.values_mut() {
            c.objects.retain(|o| *o != id);
        }
        if let Some(target) = self.collections.get_mut(&collection) {
            target.objects.push(id);
        }
        Ok(())
    }

    fn shade_smooth(&mut self, id: ObjectId) -> SceneResult<()> {
        let object = self.get_mut(id)?;
        if object.mesh.is_none() {
            return Err(SceneError::NotAMesh(id));
        }
        object.smooth = true;
        Ok(())
    }

    fn merge_by_distance(&mut self, id: ObjectId, threshold: f64) -> SceneResult<usize> {
        let (object, mut mesh) = self.mesh_object_mut(id)?;
        let removed = mesh.merge_by_distance(threshold);
        object.mesh = Some(mesh);
        Ok(removed)
    }

    fn recalculate_normals(&mut self, id: ObjectId) -> SceneResult<()> {
        let (object, mut mesh) = self.mesh_object_mut(id)?;
        mesh.recalculate_normals();
        object.mesh = Some(mesh);
        Ok(())
    }

    fn apply_transform(&mut self, id: ObjectId, rotation: bool, scale: bool) -> SceneResult<()> {
        let (object, mut mesh) = self.mesh_object_mut(id)?;

        let old_basis = object.basis();
        let new_rotation = if rotation { Matrix3::identity() } else { object.rotation };
        let new_scale = if scale { Vector3::repeat(1.0) } else { object.scale };
        let new_basis = new_rotation * Matrix3::from_diagonal(&new_scale);

        match new_basis.try_inverse() {
            Some(inverse) => {
                mesh.transform(&(inverse * old_basis));
                object.rotation = new_rotation;
                object.scale = new_scale;
            }
            None => debug!("Transform of {} left unapplied: singular basis", object.name),
        }
        object.mesh = Some(mesh);
        Ok(())
    }

    fn set_origin(&mut self, id: ObjectId, target: OriginTarget) -> SceneResult<()> {
        let cursor = self.cursor;
        let (object, mut mesh) = self.mesh_object_mut(id)?;
        let basis = object.basis();

        let local_target = match target {
            OriginTarget::GeometryMedian => mesh.median(),
            OriginTarget::BoundsCenter => mesh.bounds_center(),
            OriginTarget::Cursor => basis
                .try_inverse()
                .map(|inv| Point3::from(inv * (cursor - object.location))),
        };

        if let Some(local) = local_target {
            mesh.translate(&-local.coords);
            object.location += basis * local.coords;
        }
        object.mesh = Some(mesh);
        Ok(())
    }

    fn cursor_location(&self) -> Point3<f64> {
        self.cursor
    }

    fn set_cursor_location(&mut self, location: Point3<f64>) {
        self.cursor = location;
    }

    fn select_only(&mut self, ids: &[ObjectId]) {
        for (id, object) in self.objects.iter_mut() {
            object.selected = ids.contains(id);
        }
    }

    fn in_camera_view(&self) -> bool {
        self.camera_view
    }

    fn frame_selected(&mut self) {
        self.frame_requests += 1;
    }

    fn set_status_text(&mut self, text: Option<&str>) {
        self.status = text.map(str::to_string);
    }
}
