//! End-to-end job lifecycle scenarios.

use crate::prelude::*;
use rh_adapters::{ExecutorCall, FakeExecutor};
use rh_core::{JobId, JobStatus, Outcome};
use rh_engine::RunnerError;
use std::time::Duration;

#[tokio::test]
async fn three_items_all_succeed() {
    let engine = engine();
    let job = JobId::new("spec-a");
    let executor = FakeExecutor::new();

    let report = engine
        .runner(executor.clone())
        .run(job.clone(), items(3))
        .await
        .unwrap();

    assert_eq!(report.status, JobStatus::Finished);
    assert_eq!(report.success_count, 3);
    assert_eq!(report.error_count, 0);

    let record = engine.store.latest(&job).unwrap();
    assert_eq!(record.position, 2);
    assert_eq!(record.success_count, 3);
    assert_eq!(record.error_count, 0);
    assert_eq!(record.remaining, 0);
    assert_eq!(record.status, JobStatus::Finished);

    // Three result lines, no error file
    let results = read_jsonl(&engine.sink.results_path(&job));
    assert_eq!(results.len(), 3);
    assert!(!engine.sink.errors_path(&job).exists());
}

#[tokio::test]
async fn one_local_failure_still_finishes() {
    let engine = engine();
    let job = JobId::new("spec-b");
    let executor = FakeExecutor::new();
    executor.script_outcome(1, Outcome::failure("case number rejected"));

    let report = engine
        .runner(executor)
        .run(job.clone(), items(3))
        .await
        .unwrap();

    assert_eq!(report.status, JobStatus::Finished);
    assert_eq!(report.success_count, 2);
    assert_eq!(report.error_count, 1);

    let record = engine.store.latest(&job).unwrap();
    assert_eq!(record.remaining, 0);
    assert_eq!(record.status, JobStatus::Finished);

    // Exactly one failure line, carrying the human-readable reason
    let errors = read_jsonl(&engine.sink.errors_path(&job));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["index"], 1);
    assert_eq!(errors[0]["reason"], "case number rejected");
}

#[tokio::test]
async fn crash_on_item_then_successful_retry() {
    let engine = engine();
    let job = JobId::new("spec-c");
    let executor = FakeExecutor::new();
    executor.script_outcome(1, Outcome::crashed("webdriver closed unexpectedly"));

    let report = engine
        .runner(executor.clone())
        .run(job.clone(), items(3))
        .await
        .unwrap();

    assert_eq!(report.status, JobStatus::Finished);
    assert_eq!(report.success_count, 3);
    assert_eq!(report.error_count, 0);

    // Exactly one recovery observed
    assert_eq!(executor.count(&ExecutorCall::Recover), 1);

    // The crashed item was counted exactly once: one result line for it
    let results = read_jsonl(&engine.sink.results_path(&job));
    let for_item_1 = results.iter().filter(|v| v["index"] == 1).count();
    assert_eq!(for_item_1, 1);
}

#[tokio::test]
async fn initialize_failure_is_fatal_with_no_side_effects() {
    let engine = engine();
    let job = JobId::new("spec-e");
    let mut rx = engine.subscribe(&job, "observer");
    let executor = FakeExecutor::new();
    executor.fail_initialize("login page unreachable");

    let error = engine
        .runner(executor)
        .run(job.clone(), items(3))
        .await
        .unwrap_err();
    assert!(matches!(error, RunnerError::Init(_)));

    // No sink output at all
    assert!(!engine.sink.results_path(&job).exists());
    assert!(!engine.sink.errors_path(&job).exists());

    // Terminal state is visible, with exactly one terminal event
    assert_eq!(engine.store.latest(&job).unwrap().status, JobStatus::Failed);
    let events = drain(&mut rx);
    let terminals: Vec<_> = events
        .iter()
        .filter(|e| e.kind == rh_core::LogEventKind::Terminal)
        .collect();
    assert_eq!(terminals.len(), 1);
    assert_eq!(terminals[0].record.status, JobStatus::Failed);
}

#[tokio::test]
async fn terminal_message_reports_elapsed_time() {
    let engine = engine();
    let job = JobId::new("spec-elapsed");

    /// Executor that burns fake time per item.
    struct Slow {
        inner: FakeExecutor,
        clock: rh_core::FakeClock,
    }

    #[async_trait::async_trait]
    impl rh_adapters::StepExecutor for Slow {
        async fn initialize(&mut self) -> Result<(), rh_adapters::StepError> {
            self.inner.initialize().await
        }

        async fn execute(&mut self, item: &rh_core::WorkItem) -> Outcome {
            self.clock.advance(Duration::from_secs(45));
            self.inner.execute(item).await
        }

        async fn recover(&mut self) -> Result<(), rh_adapters::StepError> {
            self.inner.recover().await
        }

        async fn release(&mut self) {
            self.inner.release().await
        }
    }

    let executor = Slow {
        inner: FakeExecutor::new(),
        clock: engine.clock.clone(),
    };
    let runner = rh_engine::JobRunner::new(executor, engine.deps(), engine.clock.clone());
    let report = runner.run(job.clone(), items(4)).await.unwrap();

    assert_eq!(report.elapsed_ms, 4 * 45_000);
    let record = engine.store.latest(&job).unwrap();
    assert!(record.message.contains("3m"), "message: {}", record.message);
    assert!(record.message.contains("4 succeeded"));
}
