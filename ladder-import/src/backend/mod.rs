//! Mesh backend
//!
//! Wraps a [`MeshEngine`] with:
//! - a memoized availability check (explicit [`MeshBackend::reset_cache`])
//! - model introspection ([`MeshBackend::get_model_info`])
//! - CAD → mesh conversion ([`MeshBackend::convert`])
//! - engine installation ([`MeshBackend::install`])
//!
//! No method returns an error or panics on engine failure: callers always
//! receive a structured result or a safe default.

pub mod engine;
pub mod gmsh;

pub use engine::{EngineError, EngineSession, Entity, MeshEngine};
pub use gmsh::GmshCli;

use crate::models::{BoundingBox, ConversionError, ConversionRequest, ConversionResult, ModelInfo};
use engine::{MESH_ALGORITHM, MESH_OPTIMIZE, MESH_OPTIMIZE_NETGEN, MESH_SIZE_MAX, MESH_SIZE_MIN};
use ladder_common::config::BackendConfig;
use ladder_common::LinearUnit;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Version string reported when the engine is missing
pub const NOT_INSTALLED: &str = "Not installed";

/// Outcome of an install attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub success: bool,
    pub message: String,
}

impl InstallOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Mesh backend service
pub struct MeshBackend<E: MeshEngine> {
    engine: E,
    /// Memoized availability, `None` until checked
    available: Option<bool>,
    version: Option<String>,
    installer: Vec<String>,
    install_timeout: Duration,
}

impl MeshBackend<GmshCli> {
    /// Backend over the gmsh executable named in configuration
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(GmshCli::new(&config.gmsh_binary))
            .with_installer(config.installer.clone(), Duration::from_secs(config.install_timeout_secs))
    }
}

impl<E: MeshEngine> MeshBackend<E> {
    pub fn new(engine: E) -> Self {
        let defaults = BackendConfig::default();
        Self {
            engine,
            available: None,
            version: None,
            installer: defaults.installer,
            install_timeout: Duration::from_secs(defaults.install_timeout_secs),
        }
    }

    /// Set the installer command line and its time bound
    pub fn with_installer(mut self, installer: Vec<String>, timeout: Duration) -> Self {
        self.installer = installer;
        self.install_timeout = timeout;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Whether the engine can be used; checked once, then cached
    pub fn is_available(&mut self) -> bool {
        if let Some(available) = self.available {
            return available;
        }

        let available = match self.engine.query_version() {
            Ok(version) => {
                info!("gmsh {} is available", version);
                self.version = Some(version);
                true
            }
            Err(e) => {
                warn!("gmsh is not installed: {}", e);
                self.version = None;
                false
            }
        };
        self.available = Some(available);
        available
    }

    /// Cached availability without checking
    pub fn cached_availability(&self) -> Option<bool> {
        self.available
    }

    /// Forget the cached availability so the next call checks again
    pub fn reset_cache(&mut self) {
        self.available = None;
        self.version = None;
    }

    /// Engine version, or [`NOT_INSTALLED`]
    pub fn version(&mut self) -> String {
        if !self.is_available() {
            return NOT_INSTALLED.to_string();
        }
        match &self.version {
            Some(version) if !version.trim().is_empty() => version.clone(),
            _ => "Unknown".to_string(),
        }
    }

    /// Run the configured installer, bounded by the install timeout
    ///
    /// On success the availability cache is reset and the engine checked again.
    pub async fn install(&mut self) -> InstallOutcome {
        let Some((program, args)) = self.installer.split_first() else {
            return InstallOutcome::failed("Installation error: no installer configured");
        };

        info!("Installing gmsh via {}...", self.installer.join(" "));

        let mut command = tokio::process::Command::new(program);
        command.args(args).kill_on_drop(true);

        let output = match tokio::time::timeout(self.install_timeout, command.output()).await {
            Err(_) => return InstallOutcome::failed("Installation timed out"),
            Ok(Err(e)) => return InstallOutcome::failed(format!("Installation error: {}", e)),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = [stderr.trim(), stdout.trim()]
                .into_iter()
                .find(|text| !text.is_empty())
                .unwrap_or("Unknown error");
            return InstallOutcome::failed(format!("pip install failed: {}", detail));
        }

        self.reset_cache();
        if self.is_available() {
            InstallOutcome::ok("gmsh installed successfully")
        } else {
            InstallOutcome::failed("gmsh installed but cannot be imported")
        }
    }

    /// Inspect a CAD file without meshing it
    ///
    /// Returns [`ModelInfo::invalid`] when the engine is missing or the file
    /// cannot be loaded.
    pub fn get_model_info(&mut self, path: &Path) -> ModelInfo {
        if !self.is_available() {
            return ModelInfo::invalid();
        }

        match self.introspect(path) {
            Ok(info) => info,
            Err(e) => {
                debug!("Failed to load model info for {}: {}", path.display(), e);
                ModelInfo::invalid()
            }
        }
    }

    fn introspect(&mut self, path: &Path) -> Result<ModelInfo, EngineError> {
        let mut session = EngineSession::open(&mut self.engine, "info")?;
        session.load(path, false)?;

        let entities = session.entities()?;
        let mut info = ModelInfo {
            valid: true,
            ..ModelInfo::invalid()
        };
        for &(dim, _) in &entities {
            info.count_entity(dim);
        }

        if !entities.is_empty() {
            match session.bounding_box() {
                Ok([xmin, ymin, zmin, xmax, ymax, zmax]) => {
                    let bbox = BoundingBox::from_corners([xmin, ymin, zmin], [xmax, ymax, zmax]);
                    info.estimated_unit = Some(LinearUnit::estimate_from_extent(bbox.max_dimension()));
                    info.bounding_box = Some(bbox);
                }
                Err(e) => debug!("Bounding box unavailable: {}", e),
            }
        }

        info.part_names = session.part_names(&entities);
        Ok(info)
    }

    /// Convert a CAD file into a surface mesh file
    pub fn convert(&mut self, request: &ConversionRequest) -> ConversionResult {
        if !self.is_available() {
            return ConversionResult::failed(ConversionError::Unavailable);
        }

        match self.run_conversion(request) {
            Ok(part_names) => ConversionResult::succeeded(part_names),
            Err(e) => ConversionResult::failed(e),
        }
    }

    fn run_conversion(&mut self, request: &ConversionRequest) -> Result<Vec<String>, ConversionError> {
        let engine_error = |e: EngineError| ConversionError::Engine(e.to_string());

        let mut session = EngineSession::open(&mut self.engine, "cad_import").map_err(engine_error)?;

        session
            .load(request.input(), request.healing())
            .map_err(|e| ConversionError::Load(e.to_string()))?;

        let part_names = match session.entities() {
            Ok(entities) => session.part_names(&entities),
            Err(_) => Vec::new(),
        };

        session.set_number(MESH_SIZE_MIN, request.mesh_size_min()).map_err(engine_error)?;
        session.set_number(MESH_SIZE_MAX, request.mesh_size_max()).map_err(engine_error)?;
        session
            .set_number(MESH_ALGORITHM, f64::from(request.algorithm().id()))
            .map_err(engine_error)?;
        if request.optimize() {
            session.set_number(MESH_OPTIMIZE, 1.0).map_err(engine_error)?;
            session.set_number(MESH_OPTIMIZE_NETGEN, 1.0).map_err(engine_error)?;
        }

        session
            .generate(2)
            .map_err(|e| ConversionError::MeshGeneration(e.to_string()))?;

        session
            .write(request.output())
            .map_err(|e| ConversionError::Export(e.to_string()))?;

        debug!(
            input = %request.input().display(),
            output = %request.output().display(),
            parts = part_names.len(),
            "Conversion finished"
        );
        Ok(part_names)
    }
}
