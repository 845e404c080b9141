// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types

use rh_adapters::{RegistryError, StepError};
use thiserror::Error;

/// Fatal errors that unwind a job runner's loop.
///
/// Everything else (item-local failures, sink/store/broadcast errors) is
/// caught, recorded, and converted into progress records and log events.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The executor could not acquire its resource; no items were attempted.
    #[error("executor initialization failed: {0}")]
    Init(#[source] StepError),

    /// Recovery after a resource crash failed.
    #[error("recovery failed: {0}")]
    Recovery(#[source] StepError),

    /// The retried item crashed the resource again.
    #[error("resource crashed again after recovery: {0}")]
    CrashLoop(String),

    /// No executor is registered for the requested system.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
