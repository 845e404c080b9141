// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log events streamed to subscribers of a job's room.

use crate::job::JobId;
use crate::progress::ProgressRecord;
use serde::{Deserialize, Serialize};

/// Kind of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogEventKind {
    /// Informational message (startup, recovery, replay-on-join)
    Log,
    /// An item completed successfully
    Success,
    /// An item failed locally
    Error,
    /// The job reached a terminal status; no further events follow
    Terminal,
}

/// One event published to a job's room.
///
/// Ephemeral: delivered at most once per subscriber per emission, but a
/// late subscriber can reconstruct current counters from the replayed
/// snapshot it receives on join.
///
/// Serializes flat: the embedded progress snapshot's fields plus `type`
/// and an ISO-8601 `timestamp`, matching the subscriber wire payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(flatten)]
    pub record: ProgressRecord,
    #[serde(rename = "type")]
    pub kind: LogEventKind,
    #[serde(rename = "timestamp", with = "iso8601")]
    pub epoch_ms: u64,
}

impl LogEvent {
    pub fn new(record: ProgressRecord, kind: LogEventKind, epoch_ms: u64) -> Self {
        Self {
            record,
            kind,
            epoch_ms,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.record.job_id
    }

    /// One-line summary for activity logs.
    pub fn log_summary(&self) -> String {
        format!(
            "{:?} job={} pos={} ok={} err={} {}",
            self.kind,
            self.record.job_id,
            self.record.position,
            self.record.success_count,
            self.record.error_count,
            self.record.message,
        )
    }
}

/// Epoch-millisecond timestamps rendered as RFC 3339 strings on the wire.
mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ms: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        let dt = DateTime::<Utc>::from_timestamp_millis(*ms as i64)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.timestamp_millis().max(0) as u64)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
