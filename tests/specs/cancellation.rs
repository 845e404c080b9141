//! Cooperative cancellation observed at item boundaries.

use crate::prelude::*;
use rh_adapters::{FakeExecutor, StepError, StepExecutor};
use rh_core::{JobId, JobStatus, LogEventKind, Outcome, WorkItem};
use rh_storage::CancelFlags;
use std::sync::Arc;

/// Executor that requests a stop while a given item is in flight.
struct StopsItself {
    inner: FakeExecutor,
    flags: Arc<CancelFlags>,
    job: JobId,
    at_index: u64,
}

#[async_trait::async_trait]
impl StepExecutor for StopsItself {
    async fn initialize(&mut self) -> Result<(), StepError> {
        self.inner.initialize().await
    }

    async fn execute(&mut self, item: &WorkItem) -> Outcome {
        if item.index == self.at_index {
            let _ = self.flags.request_cancel(&self.job);
        }
        self.inner.execute(item).await
    }

    async fn recover(&mut self) -> Result<(), StepError> {
        self.inner.recover().await
    }

    async fn release(&mut self) {
        self.inner.release().await
    }
}

#[tokio::test]
async fn stop_between_items_leaves_later_items_untouched() {
    let engine = engine();
    let job = JobId::new("cancel-1");
    let inner = FakeExecutor::new();

    // Stop requested while item 0 is in flight; honored before item 1
    let executor = StopsItself {
        inner: inner.clone(),
        flags: engine.flags.clone(),
        job: job.clone(),
        at_index: 0,
    };
    let runner = rh_engine::JobRunner::new(executor, engine.deps(), engine.clock.clone());
    let report = runner.run(job.clone(), items(3)).await.unwrap();

    assert_eq!(report.status, JobStatus::Cancelled);
    assert_eq!(report.success_count, 1);

    // Item 0 was recorded; item 1 never produced sink output
    let results = read_jsonl(&engine.sink.results_path(&job));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["index"], 0);

    let record = engine.store.latest(&job).unwrap();
    assert_eq!(record.status, JobStatus::Cancelled);
    assert_eq!(record.position, 0);
    assert_eq!(record.remaining, 2);
}

#[tokio::test]
async fn request_stop_is_idempotent() {
    let engine = engine();
    let job = JobId::new("cancel-2");

    engine.broadcaster.request_stop(&job);
    engine.broadcaster.request_stop(&job);

    let report = engine
        .runner(FakeExecutor::new())
        .run(job.clone(), items(3))
        .await
        .unwrap();

    assert_eq!(report.status, JobStatus::Cancelled);
    assert_eq!(report.success_count + report.error_count, 0);
}

#[tokio::test]
async fn out_of_band_flag_file_cancels_the_job() {
    let engine = engine();
    let job = JobId::new("cancel-3");

    // A process with no handle to the runner drops a marker file
    std::fs::write(engine.dir.path().join("flags").join("cancel-3.flag"), b"").unwrap();

    let report = engine
        .runner(FakeExecutor::new())
        .run(job.clone(), items(3))
        .await
        .unwrap();

    assert_eq!(report.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn cancelled_job_emits_a_terminal_event() {
    let engine = engine();
    let job = JobId::new("cancel-4");
    let mut rx = engine.subscribe(&job, "observer");

    engine.broadcaster.request_stop(&job);
    engine
        .runner(FakeExecutor::new())
        .run(job.clone(), items(2))
        .await
        .unwrap();

    let events = drain(&mut rx);
    // The stop notice is informational; the terminal event comes from
    // the runner itself and is distinct
    let last = events.last().unwrap();
    assert_eq!(last.kind, LogEventKind::Terminal);
    assert_eq!(last.record.status, JobStatus::Cancelled);
    assert!(events
        .iter()
        .any(|e| e.record.message.contains("stop requested")));
}

#[tokio::test]
async fn stop_after_finish_is_a_harmless_noop() {
    let engine = engine();
    let job = JobId::new("cancel-5");

    engine
        .runner(FakeExecutor::new())
        .run(job.clone(), items(2))
        .await
        .unwrap();

    // The job is already terminal; a late stop request must not error
    engine.broadcaster.request_stop(&job);
    assert!(engine.flags.is_cancelled(&job));

    // Archival clears the flag
    engine.broadcaster.archive(&job);
    assert!(!engine.flags.is_cancelled(&job));
}
