// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job execution loop.
//!
//! One runner drives one job from its first item to a terminal status:
//! items strictly in order, per-item failures isolated, a bounded
//! recovery sequence for resource crashes, a progress record after every
//! item, and cooperative cancellation observed at item boundaries only.

use crate::broadcast::EventBroadcaster;
use crate::error::RunnerError;
use rh_adapters::{ExecutorRegistry, Sink, StepExecutor};
use rh_core::{
    format_elapsed_ms, Clock, ItemResult, JobContext, JobId, JobReport, JobStatus, LogEvent,
    LogEventKind, Outcome, WorkItem,
};
use rh_storage::{CancelFlags, ProgressStore};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Shared services a runner needs besides its executor.
pub struct RunnerDeps<K, C: Clock> {
    pub sink: K,
    pub store: Arc<ProgressStore>,
    pub broadcaster: Arc<EventBroadcaster<C>>,
    pub flags: Arc<CancelFlags>,
}

/// An item outcome after crash handling: either counted as a success or
/// as an error, never a crash.
enum Settled {
    Success(ItemResult),
    Failure(String),
}

/// Drives one job. Owns its executor exclusively for the job's lifetime.
pub struct JobRunner<E, K, C: Clock> {
    executor: E,
    sink: K,
    store: Arc<ProgressStore>,
    broadcaster: Arc<EventBroadcaster<C>>,
    flags: Arc<CancelFlags>,
    clock: C,
}

impl<K, C> JobRunner<Box<dyn StepExecutor>, K, C>
where
    K: Sink,
    C: Clock,
{
    /// Build a runner by resolving the executor for `system` from the
    /// registry. An unknown system is a construction error; the job
    /// never starts.
    pub fn from_registry(
        registry: &ExecutorRegistry,
        system: &str,
        deps: RunnerDeps<K, C>,
        clock: C,
    ) -> Result<Self, RunnerError> {
        let executor = registry.resolve(system)?;
        Ok(Self::new(executor, deps, clock))
    }
}

impl<E, K, C> JobRunner<E, K, C>
where
    E: StepExecutor,
    K: Sink,
    C: Clock,
{
    pub fn new(executor: E, deps: RunnerDeps<K, C>, clock: C) -> Self {
        Self {
            executor,
            sink: deps.sink,
            store: deps.store,
            broadcaster: deps.broadcaster,
            flags: deps.flags,
            clock,
        }
    }

    /// Run the job over `items`, in order, to a terminal status.
    ///
    /// Returns `Ok` with the report for `Finished` and `Cancelled` jobs.
    /// Fatal errors (initialization or recovery failure) return `Err`
    /// after the terminal record and event have been emitted, so
    /// subscribers never hang waiting for a status that never comes.
    pub async fn run(
        mut self,
        job_id: JobId,
        items: Vec<WorkItem>,
    ) -> Result<JobReport, RunnerError> {
        let started = self.clock.now();
        let mut ctx = JobContext::new(job_id, items.len() as u64);

        info!(job_id = %ctx.job_id, total = ctx.total, "starting job");
        let total = ctx.total;
        self.emit(
            &mut ctx,
            LogEventKind::Log,
            format!("starting job with {} item(s)", total),
        );

        if let Err(e) = self.executor.initialize().await {
            let error = RunnerError::Init(e);
            self.finish(&mut ctx, started, JobStatus::Failed, error.to_string())
                .await;
            return Err(error);
        }

        ctx.status = JobStatus::Running;

        for (position, item) in items.iter().enumerate() {
            // Cancellation is observed at item boundaries only; an item
            // already in flight finishes before the flag is honored.
            if self.flags.is_cancelled(&ctx.job_id) {
                info!(job_id = %ctx.job_id, position = ctx.position, "cancellation flag observed");
                let done = ctx.success_count + ctx.error_count;
                let total = ctx.total;
                let report = self
                    .finish(
                        &mut ctx,
                        started,
                        JobStatus::Cancelled,
                        format!("job cancelled after {} of {} item(s)", done, total),
                    )
                    .await;
                return Ok(report);
            }

            ctx.advance(position as u64);

            let settled = match self.run_item(&mut ctx, item).await {
                Ok(settled) => settled,
                Err(error) => {
                    self.finish(&mut ctx, started, JobStatus::Failed, error.to_string())
                        .await;
                    return Err(error);
                }
            };

            match settled {
                Settled::Success(result) => {
                    if let Err(e) = self.sink.record_success(&ctx.job_id, item, &result).await {
                        warn!(
                            job_id = %ctx.job_id,
                            position = ctx.position,
                            error = %e,
                            "sink write failed for successful item"
                        );
                    }
                    ctx.record_success();
                    self.emit(
                        &mut ctx,
                        LogEventKind::Success,
                        format!("item {} completed", item.index),
                    );
                }
                Settled::Failure(reason) => {
                    if let Err(e) = self.sink.record_failure(&ctx.job_id, item, &reason).await {
                        warn!(
                            job_id = %ctx.job_id,
                            position = ctx.position,
                            error = %e,
                            "sink write failed for failed item"
                        );
                    }
                    ctx.record_error();
                    self.emit(
                        &mut ctx,
                        LogEventKind::Error,
                        format!("item {} failed: {}", item.index, reason),
                    );
                }
            }
        }

        ctx.status = JobStatus::Finalizing;
        self.emit(
            &mut ctx,
            LogEventKind::Log,
            "all items processed; finishing".to_string(),
        );

        let elapsed_ms = self.elapsed_ms(started);
        let message = format!(
            "finished in {} | {} succeeded, {} failed",
            format_elapsed_ms(elapsed_ms),
            ctx.success_count,
            ctx.error_count,
        );
        Ok(self
            .finish(&mut ctx, started, JobStatus::Finished, message)
            .await)
    }

    /// Execute one item, absorbing a single resource crash.
    ///
    /// On `ResourceCrashed`, re-acquires the resource once and retries
    /// the same item. A failed recovery, or a second crash on the retry,
    /// is fatal; the crash-recover cycle must not loop on one item.
    async fn run_item(
        &mut self,
        ctx: &mut JobContext,
        item: &WorkItem,
    ) -> Result<Settled, RunnerError> {
        let reason = match self.executor.execute(item).await {
            Outcome::Success(result) => return Ok(Settled::Success(result)),
            Outcome::Failure { reason } => return Ok(Settled::Failure(reason)),
            Outcome::ResourceCrashed { reason } => reason,
        };

        ctx.status = JobStatus::Recovering;
        warn!(
            job_id = %ctx.job_id,
            position = ctx.position,
            reason = %reason,
            "resource crashed, recovering"
        );
        self.emit(
            ctx,
            LogEventKind::Log,
            format!(
                "resource crashed at item {}: {}; reinitializing",
                item.index, reason
            ),
        );

        self.executor.recover().await.map_err(RunnerError::Recovery)?;

        ctx.status = JobStatus::Running;
        self.emit(
            ctx,
            LogEventKind::Log,
            format!("recovered; retrying item {}", item.index),
        );

        match self.executor.execute(item).await {
            Outcome::Success(result) => Ok(Settled::Success(result)),
            Outcome::Failure { reason } => Ok(Settled::Failure(reason)),
            Outcome::ResourceCrashed { reason } => Err(RunnerError::CrashLoop(reason)),
        }
    }

    /// Release the resource and emit the terminal record and event.
    async fn finish(
        &mut self,
        ctx: &mut JobContext,
        started: Instant,
        status: JobStatus,
        message: String,
    ) -> JobReport {
        self.executor.release().await;

        ctx.status = status;
        self.emit(ctx, LogEventKind::Terminal, message);

        let elapsed_ms = self.elapsed_ms(started);
        info!(
            job_id = %ctx.job_id,
            status = %status,
            success = ctx.success_count,
            errors = ctx.error_count,
            elapsed_ms,
            "job reached terminal status"
        );

        JobReport {
            job_id: ctx.job_id.clone(),
            status,
            total: ctx.total,
            success_count: ctx.success_count,
            error_count: ctx.error_count,
            elapsed_ms,
        }
    }

    /// Write a progress record and publish the matching log event.
    ///
    /// Store and broadcast failures never propagate into the job's
    /// control flow.
    fn emit(&self, ctx: &mut JobContext, kind: LogEventKind, message: String) {
        ctx.message = message;
        let record = ctx.snapshot();

        if let Err(e) = self.store.write(&record) {
            warn!(
                job_id = %ctx.job_id,
                position = ctx.position,
                error = %e,
                "progress store write failed"
            );
        }

        self.broadcaster
            .publish(LogEvent::new(record, kind, self.clock.epoch_ms()));
    }

    fn elapsed_ms(&self, started: Instant) -> u64 {
        self.clock
            .now()
            .saturating_duration_since(started)
            .as_millis() as u64
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
