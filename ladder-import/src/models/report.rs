//! Batch completion report

use crate::error::FileFailure;
use crate::scene::ObjectId;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// How a batch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Finished,
    Cancelled,
}

/// Non-fatal, per-file failure
#[derive(Debug, Clone)]
pub struct FileWarning {
    pub file: PathBuf,
    pub failure: FileFailure,
    pub occurred_at: DateTime<Utc>,
}

impl FileWarning {
    pub fn new(file: PathBuf, failure: FileFailure) -> Self {
        Self {
            file,
            failure,
            occurred_at: Utc::now(),
        }
    }

    /// One-line message naming the file
    pub fn message(&self) -> String {
        let name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.display().to_string());
        format!("Failed to convert {}: {}", name, self.failure)
    }
}

/// Result of one batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    /// Objects created by this batch, in creation order
    pub objects: Vec<ObjectId>,
    pub files_total: usize,
    /// Files attempted before the batch ended
    pub files_processed: usize,
    pub warnings: Vec<FileWarning>,
    pub elapsed: Duration,
    pub message: String,
}

impl BatchReport {
    pub fn is_cancelled(&self) -> bool {
        self.outcome == BatchOutcome::Cancelled
    }

    pub fn files_failed(&self) -> usize {
        self.warnings.len()
    }
}

/// Summary line: singular phrasing for one file, plural for several
pub fn summary_message(object_count: usize, file_count: usize, elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    if file_count == 1 {
        format!("Imported {} object(s) in {:.2}s", object_count, seconds)
    } else {
        format!(
            "Imported {} object(s) from {} files in {:.2}s",
            object_count, file_count, seconds
        )
    }
}
