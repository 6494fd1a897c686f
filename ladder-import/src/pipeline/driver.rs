//! Tick sources for [`ImportPipeline`]

use super::{ImportPipeline, StepOutcome};
use crate::backend::MeshEngine;
use crate::models::BatchReport;
use crate::scene::Scene;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Period between steps when driven by a timer
pub const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Step until the batch ends; `None` when no batch was running
pub fn run_blocking<E: MeshEngine, S: Scene>(pipeline: &mut ImportPipeline<E, S>) -> Option<BatchReport> {
    loop {
        match pipeline.step() {
            StepOutcome::Continue => continue,
            StepOutcome::Finished(report) | StepOutcome::Cancelled(report) => return Some(report),
            StepOutcome::Idle => return None,
        }
    }
}

/// Step once per `period` until the batch ends
///
/// Steps run through [`tokio::task::block_in_place`], so a slow conversion
/// hands this worker's other tasks to another thread instead of stalling
/// them. Requires the multi-threaded runtime. Cancellation is seen at the
/// following step.
pub async fn drive<E: MeshEngine, S: Scene>(
    pipeline: &mut ImportPipeline<E, S>,
    period: Duration,
) -> Option<BatchReport> {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match tokio::task::block_in_place(|| pipeline.step()) {
            StepOutcome::Continue => {
                tracing::trace!(
                    percent = pipeline.progress().progress_percent(),
                    "Batch step complete"
                );
            }
            StepOutcome::Finished(report) | StepOutcome::Cancelled(report) => return Some(report),
            StepOutcome::Idle => return None,
        }
    }
}
