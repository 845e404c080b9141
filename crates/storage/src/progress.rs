// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL-backed progress record store.
//!
//! Records are held in an in-memory index for cheap reads and appended to
//! a per-job JSONL log (`<state_dir>/progress/<job_id>.jsonl`, one record
//! per line, fsynced per write) so counters survive a process restart.
//! Exactly one writer per job (the owning runner); reads are multi-tenant.

use crate::StoreError;
use parking_lot::RwLock;
use rh_core::{JobId, ProgressRecord};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// How many positions `read_latest_known` walks backwards before giving
/// up and synthesizing a zero record.
const FALLBACK_DEPTH: u64 = 2;

type JobIndex = BTreeMap<u64, ProgressRecord>;

/// Durable, shared store of per-job progress snapshots.
pub struct ProgressStore {
    dir: PathBuf,
    index: RwLock<HashMap<String, JobIndex>>,
}

impl ProgressStore {
    /// Open the store under `state_dir`, replaying any progress logs left
    /// by a previous process so readers observe prior counters.
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        let dir = state_dir.join("progress");
        fs::create_dir_all(&dir)?;

        let mut index: HashMap<String, JobIndex> = HashMap::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "jsonl") != Some(true) {
                continue;
            }
            let Some(job_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let records = Self::replay_log(&path)?;
            if !records.is_empty() {
                index.insert(job_id.to_string(), records);
            }
        }

        Ok(Self {
            dir,
            index: RwLock::new(index),
        })
    }

    /// Read one JSONL progress log, skipping corrupt lines.
    fn replay_log(path: &Path) -> Result<JobIndex, StoreError> {
        let mut records = JobIndex::new();
        let reader = BufReader::new(File::open(path)?);

        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ProgressRecord>(trimmed) {
                Ok(record) => {
                    records.insert(record.position, record);
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "corrupt progress record, skipping line"
                    );
                }
            }
        }

        Ok(records)
    }

    fn log_path(&self, job_id: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", job_id))
    }

    /// Upsert the record at `(job, position)` and append it to the job's
    /// progress log. The append is the durability point.
    pub fn write(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        {
            let mut index = self.index.write();
            index
                .entry(record.job_id.as_str().to_string())
                .or_default()
                .insert(record.position, record.clone());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(record.job_id.as_str()))?;
        file.write_all(&line)?;
        file.sync_all()?;
        Ok(())
    }

    /// Exact lookup at `(job, position)`.
    pub fn read(&self, job_id: &JobId, position: u64) -> Option<ProgressRecord> {
        self.index
            .read()
            .get(job_id.as_str())
            .and_then(|records| records.get(&position).cloned())
    }

    /// Lookup at `(job, position)`, walking backwards up to two positions
    /// before falling back to a freshly-initialized zero record.
    ///
    /// A reader (a newly joined subscriber) may observe the store slightly
    /// before the writer's first record for a brand-new job lands; the
    /// zero record keeps it from seeing nothing at all.
    pub fn read_latest_known(&self, job_id: &JobId, position: u64, total: u64) -> ProgressRecord {
        let index = self.index.read();
        if let Some(records) = index.get(job_id.as_str()) {
            let floor = position.saturating_sub(FALLBACK_DEPTH);
            let mut pos = position;
            loop {
                if let Some(record) = records.get(&pos) {
                    return record.clone();
                }
                if pos == floor {
                    break;
                }
                pos -= 1;
            }
        }
        ProgressRecord::initial(job_id.clone(), total)
    }

    /// The highest-position record known for a job, if any.
    pub fn latest(&self, job_id: &JobId) -> Option<ProgressRecord> {
        self.index
            .read()
            .get(job_id.as_str())
            .and_then(|records| records.values().next_back().cloned())
    }

    /// Drop a terminal job's records and its log file.
    ///
    /// Called at archive time only; removal failures are logged and
    /// ignored (the next open simply replays a file nobody reads).
    pub fn archive(&self, job_id: &JobId) {
        self.index.write().remove(job_id.as_str());
        let path = self.log_path(job_id.as_str());
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                warn!(
                    job_id = %job_id,
                    error = %e,
                    "failed to remove archived progress log"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
