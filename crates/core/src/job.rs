// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, lifecycle status, and the per-job context owned by the runner.

use crate::progress::ProgressRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Unique identifier for a job run.
    ///
    /// Every submitted job gets its own ID, used to key progress records,
    /// cancellation flags, broadcast rooms, and sink output files.
    #[derive(Default)]
    pub struct JobId;
}

/// Lifecycle status of a job.
///
/// `Finished`, `Failed`, and `Cancelled` are terminal; no transitions
/// leave them. Serializes to the lowercase wire names (`Finalizing`
/// maps to `"finishing"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Acquiring the external resource; no items attempted yet
    Starting,
    /// Walking work items in order
    Running,
    /// Re-acquiring a crashed external resource
    Recovering,
    /// Releasing the resource and writing the terminal record
    #[serde(rename = "finishing")]
    Finalizing,
    /// All items exhausted
    Finished,
    /// Fatal setup or recovery error
    Failed,
    /// Stopped on an observed cancellation flag
    Cancelled,
}

impl JobStatus {
    /// Check if this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Finished | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Starting => write!(f, "starting"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Recovering => write!(f, "recovering"),
            JobStatus::Finalizing => write!(f, "finishing"),
            JobStatus::Finished => write!(f, "finished"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Mutable state of one job, owned exclusively by its runner.
///
/// Passed explicitly through every call in the run loop; nothing in here
/// is ever stored in process-wide state, so concurrent jobs cannot
/// cross-talk.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job_id: JobId,
    /// Number of work items in the job's input
    pub total: u64,
    /// 0-based ordinal of the item currently (or most recently) in flight.
    /// Never decreases.
    pub position: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub status: JobStatus,
    /// Most recent human-readable progress message
    pub message: String,
}

impl JobContext {
    /// Create the context for a freshly submitted job.
    pub fn new(job_id: JobId, total: u64) -> Self {
        Self {
            job_id,
            total,
            position: 0,
            success_count: 0,
            error_count: 0,
            status: JobStatus::Starting,
            message: String::new(),
        }
    }

    /// Items not yet accounted for as success or error.
    pub fn remaining(&self) -> u64 {
        self.total
            .saturating_sub(self.success_count + self.error_count)
    }

    /// Move to the given item ordinal. Position is monotone: moving
    /// backwards is ignored.
    pub fn advance(&mut self, position: u64) {
        if position > self.position {
            self.position = position;
        }
    }

    /// Count the in-flight item as succeeded.
    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    /// Count the in-flight item as failed.
    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    /// Check if the job has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Snapshot the current counters as a progress record.
    pub fn snapshot(&self) -> ProgressRecord {
        ProgressRecord {
            job_id: self.job_id.clone(),
            position: self.position,
            total: self.total,
            remaining: self.remaining(),
            success_count: self.success_count,
            error_count: self.error_count,
            status: self.status,
            message: self.message.clone(),
        }
    }
}

/// Summary returned by the runner once a job reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: JobId,
    pub status: JobStatus,
    pub total: u64,
    pub success_count: u64,
    pub error_count: u64,
    /// Wall-clock duration from Starting through the terminal event
    pub elapsed_ms: u64,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
