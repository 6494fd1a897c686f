//! Input file resolution
//!
//! Turns the user's selection (files and directories) into the ordered list
//! of CAD files a batch will process.

use ladder_common::is_supported_extension;
use std::collections::HashSet;
use std::path::PathBuf;
use walkdir::{DirEntry, WalkDir};

/// Resolve selected paths into existing CAD files
///
/// - Files are kept when they exist and carry a supported extension.
/// - Directories are walked recursively (sorted, symlinks not followed,
///   hidden entries skipped).
/// - Duplicates are dropped; first occurrence wins.
pub fn resolve_input_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    let mut keep = |path: PathBuf| {
        if seen.insert(path.clone()) {
            files.push(path);
        }
    };

    for input in inputs {
        if input.is_dir() {
            let walker = WalkDir::new(input)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

            for entry in walker {
                match entry {
                    Ok(entry) if entry.file_type().is_file() && is_supported_extension(entry.path()) => {
                        keep(entry.into_path());
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Error accessing entry: {}", e),
                }
            }
        } else if input.is_file() && is_supported_extension(input) {
            keep(input.clone());
        } else {
            tracing::debug!("Skipping {}", input.display());
        }
    }

    files
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, b"ISO-10303-21;").unwrap();
        path
    }

    #[test]
    fn test_filters_by_extension_and_existence() {
        let dir = TempDir::new().unwrap();
        let step = touch(dir.path(), "a.step");
        let upper = touch(dir.path(), "B.IGES");
        let txt = touch(dir.path(), "notes.txt");
        let missing = dir.path().join("gone.stp");

        let resolved = resolve_input_files(&[step.clone(), txt, missing, upper.clone()]);
        assert_eq!(resolved, vec![step, upper]);
    }

    #[test]
    fn test_duplicates_removed_keeping_order() {
        let dir = TempDir::new().unwrap();
        let a = touch(dir.path(), "a.stp");
        let b = touch(dir.path(), "b.brep");

        let resolved = resolve_input_files(&[b.clone(), a.clone(), b.clone()]);
        assert_eq!(resolved, vec![b, a]);
    }

    #[test]
    fn test_directory_walk_sorted_and_skips_hidden() {
        let dir = TempDir::new().unwrap();
        let z = touch(dir.path(), "z.step");
        let nested = touch(dir.path(), "sub/inner.igs");
        let a = touch(dir.path(), "a.brp");
        touch(dir.path(), ".cache/hidden.step");
        touch(dir.path(), "sub/readme.md");

        let resolved = resolve_input_files(&[dir.path().to_path_buf()]);
        assert_eq!(resolved, vec![a, nested, z]);
    }

    #[test]
    fn test_empty_selection() {
        assert!(resolve_input_files(&[]).is_empty());
    }
}
