// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step executor adapters
//!
//! A step executor performs the actual unit of work for one item: the
//! site-specific UI automation, document generation, form filling. The
//! engine only sees the lifecycle hooks and a typed [`Outcome`] per item.

mod registry;

pub use registry::{ExecutorRegistry, RegistryError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecutorCall, FakeExecutor};

use async_trait::async_trait;
use rh_core::{Outcome, WorkItem};
use thiserror::Error;

/// Errors from executor lifecycle hooks.
///
/// These are fatal-channel errors only (setup and recovery); per-item
/// failures travel in [`Outcome`], never here.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("resource unavailable: {0}")]
    Unavailable(String),
    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Adapter that executes one work item at a time against an external
/// resource (a browser session, an API client).
///
/// The runner owns its executor exclusively from `initialize` through
/// `release`; hooks take `&mut self` and are never called concurrently.
#[async_trait]
pub trait StepExecutor: Send + 'static {
    /// Acquire the external resource and run one-time setup (open the
    /// session, authenticate). Failure here is fatal to the job.
    async fn initialize(&mut self) -> Result<(), StepError>;

    /// Perform the unit of work for one item.
    ///
    /// May block for the duration of one network- or UI-bound action.
    /// Hard per-item timeouts belong inside the implementation, not in
    /// the runner.
    async fn execute(&mut self, item: &WorkItem) -> Outcome;

    /// Re-acquire the resource from scratch after a crash, including the
    /// one-time setup `initialize` performed.
    async fn recover(&mut self) -> Result<(), StepError>;

    /// Release the resource. Must not fail; cleanup errors are the
    /// implementation's to log.
    async fn release(&mut self);
}

impl std::fmt::Debug for dyn StepExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn StepExecutor")
    }
}

#[async_trait]
impl StepExecutor for Box<dyn StepExecutor> {
    async fn initialize(&mut self) -> Result<(), StepError> {
        (**self).initialize().await
    }

    async fn execute(&mut self, item: &WorkItem) -> Outcome {
        (**self).execute(item).await
    }

    async fn recover(&mut self) -> Result<(), StepError> {
        (**self).recover().await
    }

    async fn release(&mut self) {
        (**self).release().await
    }
}
