//! Test Helper Utilities
//!
//! Shared utilities for testing ladder-import

#![allow(dead_code)]

pub mod cad_fixtures;
pub mod fake_engine;
pub mod recording_scene;

pub use cad_fixtures::{write_cad_files, CadFixture};
pub use fake_engine::{FakeEngine, FakeOutput};
pub use recording_scene::RecordingScene;

use ladder_import::models::ImportOptions;
use ladder_import::{ImportPipeline, MemoryScene, MeshBackend};
use ladder_common::{LinearUnit, SourceUnit};

/// Options with a fixed unit, so conversions are the only engine loads
pub fn millimeter_options() -> ImportOptions {
    ImportOptions {
        source_unit: SourceUnit::Unit(LinearUnit::Millimeters),
        ..ImportOptions::default()
    }
}

/// Pipeline over a fake engine and an empty scene, writing temp meshes into `temp_dir`
pub fn create_test_pipeline(
    engine: FakeEngine,
    temp_dir: &std::path::Path,
) -> ImportPipeline<FakeEngine, MemoryScene> {
    ImportPipeline::new(MeshBackend::new(engine), MemoryScene::new()).with_temp_dir(temp_dir)
}

/// Pipeline over a fake engine and a recording scene
pub fn create_recording_pipeline(
    engine: FakeEngine,
    scene: RecordingScene,
    temp_dir: &std::path::Path,
) -> ImportPipeline<FakeEngine, RecordingScene> {
    ImportPipeline::new(MeshBackend::new(engine), scene).with_temp_dir(temp_dir)
}

/// Entries left in a directory
pub fn dir_entries(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}
