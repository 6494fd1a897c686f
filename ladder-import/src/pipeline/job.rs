//! Orchestration state of one batch

use crate::models::{FileWarning, ImportOptions};
use crate::scene::{CollectionId, ObjectId};
use ladder_common::MeshSizeBounds;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

/// One user-invoked import, owned by the pipeline while it runs
#[derive(Debug)]
pub struct BatchJob {
    pub files: Vec<PathBuf>,
    pub options: ImportOptions,
    pub bounds: MeshSizeBounds,
    pub target_collection: Option<CollectionId>,
    /// Objects created so far, in creation order
    pub objects: Vec<ObjectId>,
    /// Intermediate mesh files to delete when the batch ends
    pub temp_files: Vec<PathBuf>,
    pub warnings: Vec<FileWarning>,
    pub started_at: Instant,
    pub current_index: usize,
}

impl BatchJob {
    pub fn new(
        files: Vec<PathBuf>,
        options: ImportOptions,
        bounds: MeshSizeBounds,
        target_collection: Option<CollectionId>,
    ) -> Self {
        Self {
            files,
            options,
            bounds,
            target_collection,
            objects: Vec::new(),
            temp_files: Vec::new(),
            warnings: Vec::new(),
            started_at: Instant::now(),
            current_index: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.files.len()
    }

    pub fn current_file(&self) -> Option<&PathBuf> {
        self.files.get(self.current_index)
    }

    /// Delete every registered temp file; failures are ignored
    pub fn cleanup_temp_files(&mut self) {
        for path in self.temp_files.drain(..) {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    debug!("Could not remove temp file {}: {}", path.display(), e);
                }
            }
        }
    }
}
