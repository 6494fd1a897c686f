//! Triangle mesh data and the edits used by import post-processing

use nalgebra::{Matrix3, Point3, Vector3};
use std::collections::{HashMap, VecDeque};

/// Indexed triangle mesh in object-local coordinates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriMesh {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<[usize; 3]>,
}

impl TriMesh {
    /// Build from loose triangles, sharing bit-identical corners
    pub fn from_triangles(triangles: &[[Point3<f64>; 3]]) -> Self {
        let mut mesh = TriMesh::default();
        let mut index: HashMap<[u64; 3], usize> = HashMap::new();

        for triangle in triangles {
            let mut face = [0usize; 3];
            for (slot, corner) in face.iter_mut().zip(triangle) {
                // +0.0 folds -0.0 into 0.0
                let key = [
                    (corner.x + 0.0).to_bits(),
                    (corner.y + 0.0).to_bits(),
                    (corner.z + 0.0).to_bits(),
                ];
                *slot = *index.entry(key).or_insert_with(|| {
                    mesh.vertices.push(*corner);
                    mesh.vertices.len() - 1
                });
            }
            mesh.faces.push(face);
        }
        mesh
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Mean of all vertices
    pub fn median(&self) -> Option<Point3<f64>> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self.vertices.iter().map(|v| v.coords).sum();
        Some(Point3::from(sum / self.vertices.len() as f64))
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), v| (lo.inf(v), hi.sup(v))),
        )
    }

    pub fn bounds_center(&self) -> Option<Point3<f64>> {
        let (lo, hi) = self.bounds()?;
        Some(nalgebra::center(&lo, &hi))
    }

    pub fn transform(&mut self, matrix: &Matrix3<f64>) {
        for v in &mut self.vertices {
            *v = Point3::from(matrix * v.coords);
        }
    }

    pub fn translate(&mut self, offset: &Vector3<f64>) {
        for v in &mut self.vertices {
            *v += *offset;
        }
    }

    /// Weld vertices closer than `threshold`
    ///
    /// Faces that collapse are dropped and unused vertices removed.
    /// Returns the number of vertices removed.
    pub fn merge_by_distance(&mut self, threshold: f64) -> usize {
        if threshold <= 0.0 || self.vertices.is_empty() {
            return 0;
        }

        let cell_of = |v: &Point3<f64>| v.coords.map(|c| (c / threshold).floor() as i64);
        let mut grid: HashMap<[i64; 3], Vec<usize>> = HashMap::new();
        let mut kept: Vec<Point3<f64>> = Vec::new();
        let mut remap = vec![0usize; self.vertices.len()];

        for (i, v) in self.vertices.iter().enumerate() {
            let cell = cell_of(v);
            let mut found = None;
            'search: for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let key = [cell.x + dx, cell.y + dy, cell.z + dz];
                        if let Some(candidates) = grid.get(&key) {
                            for &k in candidates {
                                if nalgebra::distance(&kept[k], v) <= threshold {
                                    found = Some(k);
                                    break 'search;
                                }
                            }
                        }
                    }
                }
            }

            remap[i] = match found {
                Some(k) => k,
                None => {
                    kept.push(*v);
                    grid.entry([cell.x, cell.y, cell.z])
                        .or_default()
                        .push(kept.len() - 1);
                    kept.len() - 1
                }
            };
        }

        let faces: Vec<[usize; 3]> = self
            .faces
            .iter()
            .map(|f| f.map(|i| remap[i]))
            .filter(|f| f[0] != f[1] && f[1] != f[2] && f[0] != f[2])
            .collect();

        let before = self.vertices.len();
        self.vertices = kept;
        self.faces = faces;
        self.remove_unused_vertices();
        before - self.vertices.len()
    }

    fn remove_unused_vertices(&mut self) {
        let mut used = vec![None; self.vertices.len()];
        let mut vertices = Vec::new();
        for face in &mut self.faces {
            for i in face.iter_mut() {
                let new_index = *used[*i].get_or_insert_with(|| {
                    vertices.push(self.vertices[*i]);
                    vertices.len() - 1
                });
                *i = new_index;
            }
        }
        self.vertices = vertices;
    }

    /// Make winding consistent across shared edges, then orient each
    /// connected part so its enclosed volume is positive
    pub fn recalculate_normals(&mut self) {
        let mut edge_faces: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (fi, f) in self.faces.iter().enumerate() {
            for (a, b) in edges(f) {
                edge_faces.entry((a.min(b), a.max(b))).or_default().push(fi);
            }
        }

        let mut visited = vec![false; self.faces.len()];
        for seed in 0..self.faces.len() {
            if visited[seed] {
                continue;
            }

            let mut component = vec![seed];
            let mut queue = VecDeque::from([seed]);
            visited[seed] = true;

            while let Some(fi) = queue.pop_front() {
                for (a, b) in edges(&self.faces[fi]) {
                    let Some(neighbors) = edge_faces.get(&(a.min(b), a.max(b))) else {
                        continue;
                    };
                    for &ni in neighbors {
                        if visited[ni] {
                            continue;
                        }
                        // Consistent neighbors traverse the shared edge the other way
                        if edges(&self.faces[ni]).any(|e| e == (a, b)) {
                            self.faces[ni].swap(1, 2);
                        }
                        visited[ni] = true;
                        component.push(ni);
                        queue.push_back(ni);
                    }
                }
            }

            let volume: f64 = component.iter().map(|&fi| self.face_volume(fi)).sum();
            if volume < 0.0 {
                for &fi in &component {
                    self.faces[fi].swap(1, 2);
                }
            }
        }
    }

    fn corners(&self, fi: usize) -> [Point3<f64>; 3] {
        self.faces[fi].map(|i| self.vertices[i])
    }

    fn face_volume(&self, fi: usize) -> f64 {
        let [a, b, c] = self.corners(fi);
        a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
    }

    /// Signed enclosed volume (positive for outward winding)
    pub fn signed_volume(&self) -> f64 {
        (0..self.faces.len()).map(|fi| self.face_volume(fi)).sum()
    }

    /// Unit normal per face; zero for degenerate faces
    pub fn face_normals(&self) -> Vec<Vector3<f64>> {
        (0..self.faces.len())
            .map(|fi| {
                let [a, b, c] = self.corners(fi);
                (b - a)
                    .cross(&(c - a))
                    .try_normalize(0.0)
                    .unwrap_or_else(Vector3::zeros)
            })
            .collect()
    }
}

fn edges(f: &[usize; 3]) -> impl Iterator<Item = (usize, usize)> {
    [(f[0], f[1]), (f[1], f[2]), (f[2], f[0])].into_iter()
}
