// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake sink for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Sink, SinkError};
use async_trait::async_trait;
use parking_lot::Mutex;
use rh_core::{ItemResult, JobId, WorkItem};
use std::sync::Arc;

/// Recorded sink call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Success {
        job_id: JobId,
        index: u64,
    },
    Failure {
        job_id: JobId,
        index: u64,
        reason: String,
    },
}

struct FakeSinkState {
    calls: Vec<SinkCall>,
    fail_writes: bool,
}

/// Fake sink that records calls in memory.
#[derive(Clone)]
pub struct FakeSink {
    inner: Arc<Mutex<FakeSinkState>>,
}

impl Default for FakeSink {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeSinkState {
                calls: Vec::new(),
                fail_writes: false,
            })),
        }
    }
}

impl FakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (to verify the engine swallows
    /// sink errors without aborting the job).
    pub fn fail_writes(&self) {
        self.inner.lock().fail_writes = true;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SinkCall> {
        self.inner.lock().calls.clone()
    }

    /// Recorded failure reasons, in call order
    pub fn failure_reasons(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::Failure { reason, .. } => Some(reason.clone()),
                SinkCall::Success { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl Sink for FakeSink {
    async fn record_success(
        &self,
        job_id: &JobId,
        item: &WorkItem,
        _result: &ItemResult,
    ) -> Result<(), SinkError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SinkCall::Success {
            job_id: job_id.clone(),
            index: item.index,
        });

        if inner.fail_writes {
            return Err(SinkError::Io(std::io::Error::other("sink unavailable")));
        }
        Ok(())
    }

    async fn record_failure(
        &self,
        job_id: &JobId,
        item: &WorkItem,
        reason: &str,
    ) -> Result<(), SinkError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SinkCall::Failure {
            job_id: job_id.clone(),
            index: item.index,
            reason: reason.to_string(),
        });

        if inner.fail_writes {
            return Err(SinkError::Io(std::io::Error::other("sink unavailable")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
