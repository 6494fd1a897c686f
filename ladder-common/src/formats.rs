//! Supported CAD file formats
//!
//! Routing between the engine's shape-import path and its generic merge path
//! is keyed purely on the filename suffix.

use std::path::Path;

/// Extensions accepted for import (lowercase, with leading dot)
pub const SUPPORTED_EXTENSIONS: [&str; 6] = [
    ".step", ".stp", // STEP (ISO 10303)
    ".iges", ".igs", // IGES
    ".brep", ".brp", // BREP (OpenCASCADE boundary representation)
];

/// Lowercased extension of `path` with a leading dot, if any
fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Check whether `path` carries a supported CAD extension (case-insensitive)
pub fn is_supported_extension(path: &Path) -> bool {
    dotted_extension(path)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Boundary-representation formats go through shape import; anything else is merged
pub fn is_brep_format(path: &Path) -> bool {
    is_supported_extension(path)
}

/// Human-readable format name for a supported extension
pub fn format_name(path: &Path) -> Option<&'static str> {
    match dotted_extension(path)?.as_str() {
        ".step" | ".stp" => Some("STEP (ISO 10303)"),
        ".iges" | ".igs" => Some("IGES"),
        ".brep" | ".brp" => Some("BREP (OpenCASCADE)"),
        _ => None,
    }
}
