// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable cancellation flags.
//!
//! A flag is a marker file `<state_dir>/flags/<job_id>.flag`. Creating
//! the file is the durable cancel request; any process that shares the
//! state directory can stop a job it has no handle to. Once set, a flag
//! is never unset until the job is archived.

use crate::StoreError;
use parking_lot::Mutex;
use rh_core::JobId;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Cancellation controller backed by marker files.
pub struct CancelFlags {
    dir: PathBuf,
    /// Flags observed or set by this process; checked before touching
    /// the file system.
    seen: Mutex<HashSet<String>>,
}

impl CancelFlags {
    /// Open the flag directory under `state_dir`, creating it if needed.
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        let dir = state_dir.join("flags");
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            seen: Mutex::new(HashSet::new()),
        })
    }

    fn flag_path(&self, job_id: &JobId) -> PathBuf {
        self.dir.join(format!("{}.flag", job_id))
    }

    /// Request cancellation of a job. Idempotent; safe to call after the
    /// job has already finished.
    ///
    /// The in-memory set is updated even when the file write fails, so a
    /// runner in this process still observes the request.
    pub fn request_cancel(&self, job_id: &JobId) -> Result<(), StoreError> {
        self.seen.lock().insert(job_id.as_str().to_string());

        let path = self.flag_path(job_id);
        if path.exists() {
            return Ok(());
        }
        fs::write(&path, b"")?;
        Ok(())
    }

    /// Check whether cancellation has been requested.
    ///
    /// Cheap (called once per item boundary) and fails closed: if the
    /// flag medium is unreadable this reports "not cancelled": a missed
    /// check is retried next item, a false positive is unrecoverable.
    pub fn is_cancelled(&self, job_id: &JobId) -> bool {
        if self.seen.lock().contains(job_id.as_str()) {
            return true;
        }

        match self.flag_path(job_id).try_exists() {
            Ok(true) => {
                self.seen.lock().insert(job_id.as_str().to_string());
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    error = %e,
                    "cancellation flag unreadable, treating as not cancelled"
                );
                false
            }
        }
    }

    /// Remove a job's flag. Called only during job archival, never during
    /// an active run.
    pub fn clear(&self, job_id: &JobId) {
        self.seen.lock().remove(job_id.as_str());
        let path = self.flag_path(job_id);
        match path.try_exists() {
            Ok(true) => {
                if let Err(e) = fs::remove_file(&path) {
                    warn!(
                        job_id = %job_id,
                        error = %e,
                        "failed to remove cancellation flag"
                    );
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    error = %e,
                    "cancellation flag unreadable during clear"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "flag_tests.rs"]
mod tests;
