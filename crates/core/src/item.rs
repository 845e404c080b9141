// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work items and per-item outcomes.
//!
//! The engine treats item payloads as opaque: it only needs the ordinal
//! index and, per item, a success/failure outcome. Payload contents are
//! the step executor's and sink's business.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One unit of work within a job, e.g. one row of an input spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Ordinal of the row in the source dataset (display ordering; the
    /// runner tracks its own 0-based position independently)
    pub index: u64,
    /// Column name to cell value
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl WorkItem {
    pub fn new(index: u64) -> Self {
        Self {
            index,
            data: HashMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Collaborator-defined payload recorded by the sink on success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl ItemResult {
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// What happened to one work item.
///
/// `Failure` is local to the item (the external resource is still
/// usable); `ResourceCrashed` means the resource itself is gone and the
/// runner must recover before anything else can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(ItemResult),
    Failure { reason: String },
    ResourceCrashed { reason: String },
}

impl Outcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        Outcome::Failure {
            reason: reason.into(),
        }
    }

    pub fn crashed(reason: impl Into<String>) -> Self {
        Outcome::ResourceCrashed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
