//! Data models for the import pipeline
//!
//! - Model introspection snapshot
//! - Conversion request/result value objects
//! - Batch progress bookkeeping
//! - Per-batch import options and the final batch report

pub mod batch_progress;
pub mod conversion;
pub mod import_options;
pub mod model_info;
pub mod report;

pub use batch_progress::{BatchProgress, Phase};
pub use conversion::{ConversionError, ConversionRequest, ConversionResult};
pub use import_options::{ImportOptions, OriginMode};
pub use model_info::{BoundingBox, ModelInfo};
pub use report::{BatchOutcome, BatchReport, FileWarning};
