// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable per-item progress snapshot.

use crate::job::{JobId, JobStatus};
use serde::{Deserialize, Serialize};

/// One snapshot of a job's counters, written after every processed item
/// (and at recovery boundaries).
///
/// Records for the same job coexist in the progress store, indexed by
/// `position`; readers prefer the highest position they can find.
/// Field names follow the subscriber wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(rename = "jobID")]
    pub job_id: JobId,
    pub position: u64,
    pub total: u64,
    pub remaining: u64,
    #[serde(rename = "successCount")]
    pub success_count: u64,
    #[serde(rename = "errorCount")]
    pub error_count: u64,
    pub status: JobStatus,
    pub message: String,
}

impl ProgressRecord {
    /// The zero record for a job no snapshot has landed for yet.
    ///
    /// Readers that observe the store before the writer's first record
    /// (a subscriber joining a brand-new job) fall back to this.
    pub fn initial(job_id: JobId, total: u64) -> Self {
        Self {
            job_id,
            position: 0,
            total,
            remaining: total,
            success_count: 0,
            error_count: 0,
            status: JobStatus::Starting,
            message: String::new(),
        }
    }

    /// Check the counter invariants:
    /// `remaining == total - successCount - errorCount` (never negative)
    /// and `successCount + errorCount <= position + 1`.
    pub fn is_consistent(&self) -> bool {
        let counted = self.success_count + self.error_count;
        counted <= self.total
            && self.remaining == self.total - counted
            && counted <= self.position + 1
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
