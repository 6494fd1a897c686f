//! Scripted mesh engine
//!
//! Records every call, fails on request (by path substring), and writes real
//! ASCII STL so the in-memory scene can import the result.

use ladder_import::backend::{EngineError, Entity, MeshEngine};
use ladder_import::scene::mesh_ops::TriMesh;
use ladder_import::scene::stl::to_ascii;
use nalgebra::Point3;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Mesh file contents written by [`FakeEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOutput {
    /// One closed tetrahedron per solid
    Tetrahedra,
    /// Zero-byte file
    Empty,
    /// Valid STL holding only empty solids
    NoSolids,
}

#[derive(Debug)]
pub struct FakeEngine {
    // Behavior
    pub available: bool,
    pub version: String,
    /// Loads fail for paths containing any of these
    pub fail_load_when: Vec<String>,
    /// Meshing fails for paths containing any of these
    pub fail_generate_when: Vec<String>,
    /// Unparseable STL is written for paths containing any of these
    pub malformed_when: Vec<String>,
    /// Names reported for volumes 1..=n
    pub part_names: Vec<String>,
    /// Solids written per converted file (one scene object each)
    pub solids_per_file: usize,
    /// Largest bounding-box dimension
    pub extent: f64,
    /// What `write` puts in the mesh file
    pub output: FakeOutput,
    /// Blocking delay inside each `generate`
    pub generate_delay: Duration,

    // Recorded calls
    pub version_queries: usize,
    pub init_count: usize,
    pub finalize_count: usize,
    pub models: Vec<String>,
    pub options: Vec<(String, f64)>,
    pub loads: Vec<PathBuf>,
    pub writes: Vec<PathBuf>,

    pub session: bool,
    pub loaded: Option<PathBuf>,
    pub meshed: bool,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            available: true,
            version: "4.13.1".to_string(),
            fail_load_when: Vec::new(),
            fail_generate_when: Vec::new(),
            malformed_when: Vec::new(),
            part_names: Vec::new(),
            solids_per_file: 1,
            extent: 50.0,
            output: FakeOutput::Tetrahedra,
            generate_delay: Duration::ZERO,
            version_queries: 0,
            init_count: 0,
            finalize_count: 0,
            models: Vec::new(),
            options: Vec::new(),
            loads: Vec::new(),
            writes: Vec::new(),
            session: false,
            loaded: None,
            meshed: false,
        }
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    pub fn failing_load(pattern: &str) -> Self {
        Self {
            fail_load_when: vec![pattern.to_string()],
            ..Self::default()
        }
    }

    /// Whether every initialize was matched by a finalize
    pub fn sessions_balanced(&self) -> bool {
        self.init_count == self.finalize_count && !self.session
    }

    pub fn option(&self, key: &str) -> Option<f64> {
        self.options
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    fn require_session(&self) -> Result<(), EngineError> {
        if self.session {
            Ok(())
        } else {
            Err(EngineError::NoSession)
        }
    }

    fn load(&mut self, path: &Path) -> Result<(), EngineError> {
        self.require_session()?;
        if !path.exists() {
            return Err(EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            )));
        }
        self.loads.push(path.to_path_buf());
        if matches_any(path, &self.fail_load_when) {
            return Err(EngineError::Command {
                status: Some(1),
                message: format!("Could not read file '{}'", path.display()),
            });
        }
        self.loaded = Some(path.to_path_buf());
        Ok(())
    }

    fn loaded(&self) -> Result<&PathBuf, EngineError> {
        self.require_session()?;
        self.loaded.as_ref().ok_or(EngineError::Command {
            status: None,
            message: "no model loaded".to_string(),
        })
    }
}

/// ASCII STL whose first vertex has two coordinates
const MALFORMED_STL: &str = "solid broken\n facet normal 0 0 1\n  outer loop\n   vertex 0 0\n   vertex 1 0 0\n   vertex 0 1 0\n  endloop\n endfacet\nendsolid broken\n";

fn matches_any(path: &Path, patterns: &[String]) -> bool {
    let text = path.to_string_lossy();
    patterns.iter().any(|p| text.contains(p.as_str()))
}

/// Tetrahedron shifted along X
fn tetrahedron(offset: f64) -> TriMesh {
    TriMesh {
        vertices: vec![
            Point3::new(offset, 0.0, 0.0),
            Point3::new(offset + 1.0, 0.0, 0.0),
            Point3::new(offset, 1.0, 0.0),
            Point3::new(offset, 0.0, 1.0),
        ],
        faces: vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]],
    }
}

impl MeshEngine for FakeEngine {
    fn query_version(&mut self) -> Result<String, EngineError> {
        self.version_queries += 1;
        if self.available {
            Ok(self.version.clone())
        } else {
            Err(EngineError::NotInstalled("gmsh not found".to_string()))
        }
    }

    fn initialize(&mut self) -> Result<(), EngineError> {
        self.init_count += 1;
        self.session = true;
        self.loaded = None;
        self.meshed = false;
        Ok(())
    }

    fn finalize(&mut self) {
        self.finalize_count += 1;
        self.session = false;
        self.loaded = None;
        self.meshed = false;
    }

    fn add_model(&mut self, name: &str) -> Result<(), EngineError> {
        self.require_session()?;
        self.models.push(name.to_string());
        Ok(())
    }

    fn set_number(&mut self, key: &str, value: f64) -> Result<(), EngineError> {
        self.require_session()?;
        self.options.push((key.to_string(), value));
        Ok(())
    }

    fn import_shapes(&mut self, path: &Path) -> Result<(), EngineError> {
        self.load(path)
    }

    fn synchronize(&mut self) -> Result<(), EngineError> {
        self.loaded().map(|_| ())
    }

    fn merge(&mut self, path: &Path) -> Result<(), EngineError> {
        self.load(path)
    }

    fn entities(&mut self) -> Result<Vec<Entity>, EngineError> {
        self.loaded()?;
        let mut entities: Vec<Entity> = Vec::new();
        entities.extend((1..=8).map(|tag| (0, tag)));
        entities.extend((1..=12).map(|tag| (1, tag)));
        entities.extend((1..=6).map(|tag| (2, tag)));
        entities.extend((1..=self.solids_per_file as i32).map(|tag| (3, tag)));
        Ok(entities)
    }

    fn bounding_box(&mut self) -> Result<[f64; 6], EngineError> {
        self.loaded()?;
        Ok([0.0, 0.0, 0.0, self.extent, self.extent / 2.0, self.extent / 4.0])
    }

    fn entity_name(&mut self, dim: i32, tag: i32) -> Result<String, EngineError> {
        self.loaded()?;
        if dim != 3 || tag < 1 {
            return Ok(String::new());
        }
        Ok(self
            .part_names
            .get(tag as usize - 1)
            .cloned()
            .unwrap_or_default())
    }

    fn generate(&mut self, _dim: i32) -> Result<(), EngineError> {
        let loaded = self.loaded()?.clone();
        if !self.generate_delay.is_zero() {
            std::thread::sleep(self.generate_delay);
        }
        if matches_any(&loaded, &self.fail_generate_when) {
            return Err(EngineError::Command {
                status: Some(1),
                message: "meshing failed: no elements".to_string(),
            });
        }
        self.meshed = true;
        Ok(())
    }

    fn write(&mut self, path: &Path) -> Result<(), EngineError> {
        self.require_session()?;
        if !self.meshed {
            return Err(EngineError::Command {
                status: None,
                message: "no mesh".to_string(),
            });
        }
        self.writes.push(path.to_path_buf());

        let malformed = self
            .loaded
            .as_ref()
            .is_some_and(|loaded| matches_any(loaded, &self.malformed_when));
        if malformed {
            std::fs::write(path, MALFORMED_STL)?;
            return Ok(());
        }

        let text = match self.output {
            FakeOutput::Tetrahedra => (0..self.solids_per_file)
                .map(|i| to_ascii(&format!("solid_{}", i), &tetrahedron(i as f64 * 10.0)))
                .collect(),
            FakeOutput::Empty => String::new(),
            FakeOutput::NoSolids => (0..self.solids_per_file)
                .map(|i| format!("solid empty_{i}\nendsolid empty_{i}\n"))
                .collect(),
        };
        std::fs::write(path, text)?;
        Ok(())
    }
}
