//! Configuration loading
//!
//! `ladder.toml` is resolved in priority order:
//! 1. Explicit path (command-line `--config`)
//! 2. `LADDER_CONFIG` environment variable
//! 3. `<user config dir>/ladder/ladder.toml`
//! 4. Compiled defaults
//!
//! A missing or malformed file never stops the tool: a warning is logged
//! and compiled defaults are used instead.

use crate::quality::MeshQuality;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "LADDER_CONFIG";

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Mesh backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Import defaults applied when a flag is not given
    #[serde(default)]
    pub defaults: ImportDefaults,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Mesh backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// gmsh executable (name on PATH or absolute path)
    #[serde(default = "default_gmsh_binary")]
    pub gmsh_binary: String,

    /// Installer command line, program first
    #[serde(default = "default_installer")]
    pub installer: Vec<String>,

    /// Upper bound for the installer subprocess
    #[serde(default = "default_install_timeout_secs")]
    pub install_timeout_secs: u64,
}

/// Import defaults (the persisted preferences of an interactive host)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDefaults {
    #[serde(default)]
    pub mesh_quality: MeshQuality,

    #[serde(default = "default_mesh_size_min")]
    pub mesh_size_min: f64,

    #[serde(default = "default_mesh_size_max")]
    pub mesh_size_max: f64,

    #[serde(default = "default_global_scale")]
    pub global_scale: f64,

    #[serde(default)]
    pub import_to_collection: bool,

    #[serde(default)]
    pub smooth_shading: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_gmsh_binary() -> String {
    "gmsh".to_string()
}

fn default_installer() -> Vec<String> {
    ["python3", "-m", "pip", "install", "gmsh"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_install_timeout_secs() -> u64 {
    120
}

fn default_mesh_size_min() -> f64 {
    0.1
}

fn default_mesh_size_max() -> f64 {
    10.0
}

fn default_global_scale() -> f64 {
    1.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            gmsh_binary: default_gmsh_binary(),
            installer: default_installer(),
            install_timeout_secs: default_install_timeout_secs(),
        }
    }
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            mesh_quality: MeshQuality::default(),
            mesh_size_min: default_mesh_size_min(),
            mesh_size_max: default_mesh_size_max(),
            global_scale: default_global_scale(),
            import_to_collection: false,
            smooth_shading: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file; errors name the file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: read failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Load the resolved config file
    ///
    /// Compiled defaults when no file is found; an error when the file
    /// exists or was named explicitly but cannot be used.
    pub fn try_load(explicit: Option<&Path>) -> Result<Self> {
        let Some(path) = resolve_config_path(explicit) else {
            debug!("No config file found, using compiled defaults");
            return Ok(Self::default());
        };

        let config = Self::from_file(&path)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Load configuration with graceful degradation
    ///
    /// Returns compiled defaults when no file is found or the file is unusable.
    pub fn load(explicit: Option<&Path>) -> Self {
        Self::try_load(explicit).unwrap_or_else(|e| {
            warn!("Ignoring config file: {}", e);
            Self::default()
        })
    }

    fn validate(&self) -> Result<()> {
        if self.backend.gmsh_binary.trim().is_empty() {
            return Err(Error::Config("backend.gmsh_binary must not be empty".to_string()));
        }
        if self.backend.installer.is_empty() {
            return Err(Error::Config("backend.installer must name a program".to_string()));
        }
        if !self.defaults.global_scale.is_finite() || self.defaults.global_scale <= 0.0 {
            return Err(Error::Config(format!(
                "defaults.global_scale must be positive (got {})",
                self.defaults.global_scale
            )));
        }
        Ok(())
    }
}

/// Find the configuration file to load, honoring priority order
///
/// An explicit path is returned even if it does not exist, so that the
/// caller reports it instead of silently falling through.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|path| path.exists())
}

/// Platform config location: `<config dir>/ladder/ladder.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ladder").join("ladder.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.backend.install_timeout_secs, 120);
        assert_eq!(config.defaults.mesh_quality, MeshQuality::Normal);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections() {
        let config = TomlConfig::from_toml_str(
            r#"
            [defaults]
            mesh_quality = "VERY_FINE"
            smooth_shading = true

            [backend]
            gmsh_binary = "/opt/gmsh/bin/gmsh"
            "#,
        )
        .unwrap();

        assert_eq!(config.defaults.mesh_quality, MeshQuality::VeryFine);
        assert!(config.defaults.smooth_shading);
        assert_eq!(config.defaults.global_scale, 1.0);
        assert_eq!(config.backend.gmsh_binary, "/opt/gmsh/bin/gmsh");
        assert_eq!(config.backend.installer[0], "python3");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(TomlConfig::from_toml_str("[defaults]\nglobal_scale = 0.0").is_err());
        assert!(TomlConfig::from_toml_str("[backend]\ninstaller = []").is_err());
        assert!(TomlConfig::from_toml_str("[defaults]\nmesh_quality = \"ULTRA\"").is_err());
    }
}
