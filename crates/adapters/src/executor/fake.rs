// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake step executor for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{StepError, StepExecutor};
use async_trait::async_trait;
use parking_lot::Mutex;
use rh_core::{ItemResult, Outcome, WorkItem};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Recorded executor call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorCall {
    Initialize,
    Execute { index: u64 },
    Recover,
    Release,
}

struct FakeExecutorState {
    calls: Vec<ExecutorCall>,
    /// Scripted outcomes per item index; each execute pops the front.
    /// Items with no script succeed with an empty result.
    script: HashMap<u64, VecDeque<Outcome>>,
    fail_initialize: Option<String>,
    fail_recover: Option<String>,
}

/// Fake step executor with scripted per-item outcomes.
///
/// Clones share state, so tests can keep a handle for assertions while
/// the runner owns the executor.
#[derive(Clone)]
pub struct FakeExecutor {
    inner: Arc<Mutex<FakeExecutorState>>,
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeExecutorState {
                calls: Vec::new(),
                script: HashMap::new(),
                fail_initialize: None,
                fail_recover: None,
            })),
        }
    }
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for the item with the given index. Multiple
    /// outcomes for the same index are consumed in order (so a crash can
    /// be followed by a successful retry).
    pub fn script_outcome(&self, index: u64, outcome: Outcome) {
        self.inner
            .lock()
            .script
            .entry(index)
            .or_default()
            .push_back(outcome);
    }

    /// Make `initialize` fail with the given reason.
    pub fn fail_initialize(&self, reason: impl Into<String>) {
        self.inner.lock().fail_initialize = Some(reason.into());
    }

    /// Make `recover` fail with the given reason.
    pub fn fail_recover(&self, reason: impl Into<String>) {
        self.inner.lock().fail_recover = Some(reason.into());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.inner.lock().calls.clone()
    }

    /// Count recorded calls of a kind
    pub fn count(&self, call: &ExecutorCall) -> usize {
        self.inner.lock().calls.iter().filter(|c| *c == call).count()
    }
}

#[async_trait]
impl StepExecutor for FakeExecutor {
    async fn initialize(&mut self) -> Result<(), StepError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Initialize);

        match inner.fail_initialize.take() {
            Some(reason) => Err(StepError::Unavailable(reason)),
            None => Ok(()),
        }
    }

    async fn execute(&mut self, item: &WorkItem) -> Outcome {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Execute { index: item.index });

        inner
            .script
            .get_mut(&item.index)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Outcome::Success(ItemResult::default()))
    }

    async fn recover(&mut self) -> Result<(), StepError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Recover);

        match inner.fail_recover.take() {
            Some(reason) => Err(StepError::Unavailable(reason)),
            None => Ok(()),
        }
    }

    async fn release(&mut self) {
        self.inner.lock().calls.push(ExecutorCall::Release);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
