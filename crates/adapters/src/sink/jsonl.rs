// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL file sink.
//!
//! Appends one line per outcome to per-job files under the output
//! directory: `<job_id>.results.jsonl` for successes and
//! `<job_id>.errors.jsonl` for failures.

use super::{Sink, SinkError};
use async_trait::async_trait;
use rh_core::{ItemResult, JobId, WorkItem};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct SuccessLine<'a> {
    index: u64,
    item: &'a WorkItem,
    result: &'a ItemResult,
}

#[derive(Serialize)]
struct FailureLine<'a> {
    index: u64,
    item: &'a WorkItem,
    reason: &'a str,
}

/// Sink writing per-job JSONL output files.
#[derive(Clone)]
pub struct JsonlSink {
    output_dir: PathBuf,
}

impl JsonlSink {
    /// Create a sink rooted at `output_dir`, creating it if needed.
    pub fn new(output_dir: &Path) -> Result<Self, SinkError> {
        fs::create_dir_all(output_dir)?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Path of a job's success output file.
    pub fn results_path(&self, job_id: &JobId) -> PathBuf {
        self.output_dir.join(format!("{}.results.jsonl", job_id))
    }

    /// Path of a job's failure output file.
    pub fn errors_path(&self, job_id: &JobId) -> PathBuf {
        self.output_dir.join(format!("{}.errors.jsonl", job_id))
    }

    fn append_line(path: &Path, line: &[u8]) -> Result<(), SinkError> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(line)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        Ok(())
    }
}

#[async_trait]
impl Sink for JsonlSink {
    async fn record_success(
        &self,
        job_id: &JobId,
        item: &WorkItem,
        result: &ItemResult,
    ) -> Result<(), SinkError> {
        let line = serde_json::to_vec(&SuccessLine {
            index: item.index,
            item,
            result,
        })?;
        Self::append_line(&self.results_path(job_id), &line)
    }

    async fn record_failure(
        &self,
        job_id: &JobId,
        item: &WorkItem,
        reason: &str,
    ) -> Result<(), SinkError> {
        let line = serde_json::to_vec(&FailureLine {
            index: item.index,
            item,
            reason,
        })?;
        Self::append_line(&self.errors_path(job_id), &line)
    }
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
