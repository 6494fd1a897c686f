//! Batch import pipeline
//!
//! Steppable state machine: `Idle → Running → {Finished, Cancelled}`.
//! [`ImportPipeline::start`] validates the selection and prepares a
//! [`BatchJob`]; every [`ImportPipeline::step`] then does exactly one unit of
//! work (one file's conversion, import and post-processing, or the final
//! completion/cancellation). Cancellation is only observed at the start of a
//! step, so a conversion in progress always runs to completion.
//!
//! A failing file contributes zero objects and one warning; it never aborts
//! the batch.

pub mod driver;
pub mod job;
pub mod naming;

pub use driver::{drive, run_blocking, TICK_INTERVAL};
pub use job::BatchJob;

use crate::backend::{MeshBackend, MeshEngine};
use crate::error::{FileFailure, PipelineError};
use crate::models::report::summary_message;
use crate::models::{
    BatchOutcome, BatchProgress, BatchReport, ConversionRequest, FileWarning, ImportOptions,
    OriginMode, Phase,
};
use crate::scene::{ObjectId, ObjectKind, OriginTarget, Scene, SceneResult};
use crate::services::resolve_input_files;
use ladder_common::{LinearUnit, MeshSizeBounds, SourceUnit};
use nalgebra::Point3;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Lifecycle of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Finished,
    Cancelled,
}

/// Result of one [`ImportPipeline::step`]
#[derive(Debug)]
pub enum StepOutcome {
    /// No batch is running
    Idle,
    /// One file was processed; more work remains
    Continue,
    Finished(BatchReport),
    Cancelled(BatchReport),
}

/// Batch driver over a mesh backend and a host scene
pub struct ImportPipeline<E: MeshEngine, S: Scene> {
    backend: MeshBackend<E>,
    scene: S,
    progress: BatchProgress,
    job: Option<BatchJob>,
    state: PipelineState,
    cancel: CancellationToken,
    /// Directory for intermediate meshes (system temp dir when unset)
    temp_dir: Option<PathBuf>,
}

impl<E: MeshEngine, S: Scene> ImportPipeline<E, S> {
    pub fn new(backend: MeshBackend<E>, scene: S) -> Self {
        Self {
            backend,
            scene,
            progress: BatchProgress::new(),
            job: None,
            state: PipelineState::Idle,
            cancel: CancellationToken::new(),
            temp_dir: None,
        }
    }

    /// Write intermediate meshes into `dir`
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn backend(&self) -> &MeshBackend<E> {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut MeshBackend<E> {
        &mut self.backend
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn into_parts(self) -> (MeshBackend<E>, S) {
        (self.backend, self.scene)
    }

    pub fn progress(&self) -> &BatchProgress {
        &self.progress
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PipelineState::Running
    }

    /// The running batch, if any
    pub fn job(&self) -> Option<&BatchJob> {
        self.job.as_ref()
    }

    /// Token that cancels the running batch at its next step
    ///
    /// A token stays valid across batches until it is used.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Begin a batch; returns the number of files to process
    ///
    /// Fails before touching the scene when the backend is missing or no
    /// importable file was selected.
    pub fn start(&mut self, inputs: &[PathBuf], options: ImportOptions) -> Result<usize, PipelineError> {
        if self.is_running() {
            return Err(PipelineError::AlreadyRunning);
        }

        if !self.backend.is_available() {
            error!("gmsh is not installed");
            return Err(PipelineError::BackendUnavailable);
        }

        let files = resolve_input_files(inputs);
        if files.is_empty() {
            return Err(PipelineError::NoFilesResolved);
        }

        let bounds = MeshSizeBounds::resolve(
            options.mesh_quality,
            options.mesh_size_min,
            options.mesh_size_max,
        )?;
        if !options.global_scale.is_finite() || options.global_scale <= 0.0 {
            return Err(ladder_common::Error::InvalidInput(format!(
                "scale must be a positive number (got {})",
                options.global_scale
            ))
            .into());
        }
        if !options.merge_distance.is_finite() || options.merge_distance < 0.0 {
            return Err(ladder_common::Error::InvalidInput(format!(
                "merge distance must be a non-negative number (got {})",
                options.merge_distance
            ))
            .into());
        }

        let target_collection = if options.import_to_collection {
            let name = naming::collection_name(
                options.collection_name.as_deref(),
                &file_stem(&files[0]),
                files.len(),
            );
            Some(self.scene.new_collection(&name))
        } else {
            None
        };

        let total = files.len();
        info!(
            total,
            quality = %options.mesh_quality,
            min = bounds.min,
            max = bounds.max,
            "Starting CAD import"
        );

        // A token cancelled by an earlier batch must not stop this one
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
        self.progress.start(total);
        self.job = Some(BatchJob::new(files, options, bounds, target_collection));
        self.state = PipelineState::Running;
        Ok(total)
    }

    /// Advance the batch by one unit of work
    pub fn step(&mut self) -> StepOutcome {
        if self.state != PipelineState::Running {
            return StepOutcome::Idle;
        }
        let Some(mut job) = self.job.take() else {
            self.state = PipelineState::Idle;
            return StepOutcome::Idle;
        };

        if self.cancel.is_cancelled() {
            return StepOutcome::Cancelled(self.finish_cancelled(job));
        }

        if job.is_complete() {
            return StepOutcome::Finished(self.finish(job));
        }

        let index = job.current_index;
        let input = job.files[index].clone();
        match self.process_file(&mut job, &input) {
            Ok(objects) => job.objects.extend(objects),
            Err(failure) => {
                error!(file = %input.display(), index, "Import failed: {}", failure);
                job.warnings.push(FileWarning::new(input, failure));
            }
        }

        // Status stays as the last phase wrote it
        job.current_index += 1;
        self.job = Some(job);
        StepOutcome::Continue
    }

    fn set_phase(&mut self, index: usize, name: &str, phase: Phase) {
        self.progress.update(index, name, phase);
        let status = self.progress.status_text();
        self.scene.set_status_text(Some(&status));
    }

    /// Convert, import and post-process one file
    fn process_file(&mut self, job: &mut BatchJob, input: &Path) -> Result<Vec<ObjectId>, FileFailure> {
        let index = job.current_index;
        let display_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.set_phase(index, &display_name, Phase::Converting);

        // Registered before conversion so a failure still gets it cleaned up
        let output = self.allocate_temp_file()?;
        job.temp_files.push(output.clone());

        let unit_scale = self.resolve_unit_scale(job.options.source_unit, input);

        let request = ConversionRequest::new(input, &output, job.bounds)
            .with_algorithm(job.options.algorithm)
            .with_optimize(job.options.optimize_mesh)
            .with_healing(job.options.healing);
        let part_names = self.backend.convert(&request).into_result()?;

        let produced = std::fs::metadata(&output)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(FileFailure::MissingOutput);
        }

        self.set_phase(index, &display_name, Phase::Importing);

        // The scene does not report what it created; diff the object set
        let before: HashSet<ObjectId> = self.scene.objects().into_iter().collect();
        let final_scale = job.options.global_scale * unit_scale;
        self.scene
            .import_stl(&output, final_scale)
            .map_err(|e| FileFailure::Import(e.to_string()))?;
        let new_objects: Vec<ObjectId> = self
            .scene
            .objects()
            .into_iter()
            .filter(|id| !before.contains(id))
            .collect();

        if new_objects.is_empty() {
            return Err(FileFailure::NoObjectsProduced);
        }

        let names = naming::plan_object_names(
            &file_stem(input),
            new_objects.len(),
            &part_names,
            job.options.use_part_names,
        );
        for (id, name) in new_objects.iter().zip(&names) {
            if let Err(e) = self.scene.rename(*id, name) {
                warn!("Could not rename {} to {}: {}", id, name, e);
            }
        }

        if let Some(collection) = job.target_collection {
            for id in &new_objects {
                if let Err(e) = self.scene.move_to_collection(*id, collection) {
                    warn!("Could not move {} to collection: {}", id, e);
                }
            }
        }

        for id in &new_objects {
            if self.scene.object_kind(*id) != Some(ObjectKind::Mesh) {
                continue;
            }
            if let Err(e) = self.post_process(*id, &job.options) {
                warn!("Post-processing of {} failed: {}", id, e);
            }
        }

        info!(
            file = %input.display(),
            objects = new_objects.len(),
            scale = final_scale,
            "Imported file"
        );
        Ok(new_objects)
    }

    fn allocate_temp_file(&self) -> Result<PathBuf, FileFailure> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ladder_").suffix(".stl");
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| FileFailure::TempFile(e.to_string()))?;

        file.into_temp_path()
            .keep()
            .map_err(|e| FileFailure::TempFile(e.to_string()))
    }

    /// Meters per source unit, estimating from the model when asked to
    fn resolve_unit_scale(&mut self, source_unit: SourceUnit, input: &Path) -> f64 {
        let unit = match source_unit {
            SourceUnit::Unit(unit) => unit,
            SourceUnit::Auto => self
                .backend
                .get_model_info(input)
                .estimated_unit
                .unwrap_or(LinearUnit::Millimeters),
        };
        unit.scale_to_meters()
    }

    /// Post-processing of one mesh object, each step gated by its option
    fn post_process(&mut self, id: ObjectId, options: &ImportOptions) -> SceneResult<()> {
        if options.smooth_shading {
            self.scene.shade_smooth(id)?;
        }
        if options.merge_distance > 0.0 {
            self.scene.merge_by_distance(id, options.merge_distance)?;
        }
        if options.recalc_normals {
            self.scene.recalculate_normals(id)?;
        }
        if options.apply_transform {
            self.scene.apply_transform(id, true, true)?;
        }

        match options.set_origin {
            OriginMode::None => Ok(()),
            OriginMode::Geometry => self.scene.set_origin(id, OriginTarget::GeometryMedian),
            OriginMode::Bounds => self.scene.set_origin(id, OriginTarget::BoundsCenter),
            OriginMode::Cursor => self.scene.set_origin(id, OriginTarget::Cursor),
            OriginMode::World => {
                // Origin-to-cursor is the only primitive; borrow the cursor
                let saved = self.scene.cursor_location();
                self.scene.set_cursor_location(Point3::origin());
                let result = self.scene.set_origin(id, OriginTarget::Cursor);
                self.scene.set_cursor_location(saved);
                result
            }
        }
    }

    fn finish(&mut self, mut job: BatchJob) -> BatchReport {
        self.progress.stop();
        self.scene.set_status_text(None);
        job.cleanup_temp_files();

        let objects: Vec<ObjectId> = job
            .objects
            .iter()
            .copied()
            .filter(|id| self.scene.contains(*id))
            .collect();
        self.scene.select_only(&objects);
        if !self.scene.in_camera_view() {
            self.scene.frame_selected();
        }

        let elapsed = job.started_at.elapsed();
        let message = summary_message(objects.len(), job.total(), elapsed);
        info!("{}", message);

        self.state = PipelineState::Finished;
        BatchReport {
            outcome: BatchOutcome::Finished,
            objects,
            files_total: job.total(),
            files_processed: job.current_index,
            warnings: job.warnings,
            elapsed,
            message,
        }
    }

    fn finish_cancelled(&mut self, mut job: BatchJob) -> BatchReport {
        self.progress.stop();
        self.progress.cancel();
        self.scene.set_status_text(None);
        job.cleanup_temp_files();

        if let Some(collection) = job.target_collection {
            if matches!(self.scene.collection_len(collection), Ok(0)) {
                if let Err(e) = self.scene.remove_collection(collection) {
                    warn!("Could not remove empty collection: {}", e);
                }
            }
        }

        info!(
            processed = job.current_index,
            total = job.total(),
            "Import cancelled"
        );

        self.state = PipelineState::Cancelled;
        let files_total = job.total();
        BatchReport {
            outcome: BatchOutcome::Cancelled,
            objects: job.objects,
            files_total,
            files_processed: job.current_index,
            warnings: job.warnings,
            elapsed: job.started_at.elapsed(),
            message: "Import cancelled".to_string(),
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
