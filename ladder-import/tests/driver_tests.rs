//! Timer-driven batches

mod helpers;

use helpers::{create_test_pipeline, millimeter_options, write_cad_files, FakeEngine};
use ladder_import::models::BatchOutcome;
use ladder_import::pipeline::drive;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[tokio::test(flavor = "multi_thread")]
async fn test_drive_runs_batch_to_completion() {
    let inputs = TempDir::new().unwrap();
    let temps = TempDir::new().unwrap();
    let files = write_cad_files(inputs.path(), &["a.step", "b.step", "c.step"]);
    let mut pipeline = create_test_pipeline(FakeEngine::new(), temps.path());

    pipeline.start(&files, millimeter_options()).unwrap();
    let report = drive(&mut pipeline, Duration::from_millis(1))
        .await
        .expect("report");

    assert_eq!(report.outcome, BatchOutcome::Finished);
    assert_eq!(report.objects.len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_drive_observes_cancellation() {
    let inputs = TempDir::new().unwrap();
    let temps = TempDir::new().unwrap();
    let files = write_cad_files(inputs.path(), &["a.step", "b.step"]);
    let mut pipeline = create_test_pipeline(FakeEngine::new(), temps.path());

    pipeline.start(&files, millimeter_options()).unwrap();
    pipeline.cancel_token().cancel();
    let report = drive(&mut pipeline, Duration::from_millis(1)).await.unwrap();

    assert_eq!(report.outcome, BatchOutcome::Cancelled);
    assert!(pipeline.backend().engine().loads.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_drive_without_batch() {
    let temps = TempDir::new().unwrap();
    let mut pipeline = create_test_pipeline(FakeEngine::new(), temps.path());
    assert!(drive(&mut pipeline, Duration::from_millis(1)).await.is_none());
}

/// A slow conversion must not stall other tasks on the same worker
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_slow_step_does_not_stall_runtime() {
    let inputs = TempDir::new().unwrap();
    let temps = TempDir::new().unwrap();
    let files = write_cad_files(inputs.path(), &["a.step", "b.step"]);
    let engine = FakeEngine {
        generate_delay: Duration::from_millis(250),
        ..FakeEngine::default()
    };
    let mut pipeline = create_test_pipeline(engine, temps.path());
    pipeline.start(&files, millimeter_options()).unwrap();

    let beats = Arc::new(Mutex::new(Vec::<Instant>::new()));
    let heartbeat = tokio::spawn({
        let beats = beats.clone();
        async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(5));
            loop {
                ticker.tick().await;
                beats.lock().unwrap().push(Instant::now());
            }
        }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let batch = tokio::spawn(async move {
        let report = drive(&mut pipeline, Duration::from_millis(1)).await;
        (pipeline, report)
    });
    let (pipeline, report) = batch.await.unwrap();
    heartbeat.abort();

    assert_eq!(report.unwrap().outcome, BatchOutcome::Finished);
    assert_eq!(pipeline.backend().engine().writes.len(), 2);

    let beats = beats.lock().unwrap();
    let longest_gap = beats
        .windows(2)
        .map(|w| w[1].duration_since(w[0]))
        .max()
        .unwrap();
    assert!(
        longest_gap < Duration::from_millis(150),
        "heartbeat stalled for {:?}",
        longest_gap
    );
}
