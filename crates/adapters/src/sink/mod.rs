// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result sink adapters
//!
//! A sink durably records per-item outcomes, keyed by job id. Writes are
//! append-only with at-least-once semantics: duplicate calls for the
//! same item must not error.

mod jsonl;

pub use jsonl::JsonlSink;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSink, SinkCall};

use async_trait::async_trait;
use rh_core::{ItemResult, JobId, WorkItem};
use thiserror::Error;

/// Errors from sink operations
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Adapter that durably records item outcomes.
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Record a successfully processed item and its result payload.
    async fn record_success(
        &self,
        job_id: &JobId,
        item: &WorkItem,
        result: &ItemResult,
    ) -> Result<(), SinkError>;

    /// Record an item that failed locally, with its human-readable reason.
    async fn record_failure(
        &self,
        job_id: &JobId,
        item: &WorkItem,
        reason: &str,
    ) -> Result<(), SinkError>;
}
