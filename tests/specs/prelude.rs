//! Shared harness for engine specs.

use rh_adapters::{FakeExecutor, JsonlSink};
use rh_core::{FakeClock, JobId, LogEvent, WorkItem};
use rh_engine::{EventBroadcaster, JobRunner, RunnerDeps, SubscriberId};
use rh_storage::{CancelFlags, ProgressStore};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// A full engine wired against a temporary state/output directory.
pub struct TestEngine {
    pub store: Arc<ProgressStore>,
    pub flags: Arc<CancelFlags>,
    pub broadcaster: Arc<EventBroadcaster<FakeClock>>,
    pub sink: JsonlSink,
    pub clock: FakeClock,
    pub dir: TempDir,
}

pub fn engine() -> TestEngine {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ProgressStore::open(dir.path()).unwrap());
    let flags = Arc::new(CancelFlags::open(dir.path()).unwrap());
    let clock = FakeClock::new();
    let broadcaster = Arc::new(EventBroadcaster::new(
        store.clone(),
        flags.clone(),
        clock.clone(),
    ));
    let sink = JsonlSink::new(&dir.path().join("output")).unwrap();

    TestEngine {
        store,
        flags,
        broadcaster,
        sink,
        clock,
        dir,
    }
}

impl TestEngine {
    pub fn deps(&self) -> RunnerDeps<JsonlSink, FakeClock> {
        RunnerDeps {
            sink: self.sink.clone(),
            store: self.store.clone(),
            broadcaster: self.broadcaster.clone(),
            flags: self.flags.clone(),
        }
    }

    pub fn runner(&self, executor: FakeExecutor) -> JobRunner<FakeExecutor, JsonlSink, FakeClock> {
        JobRunner::new(executor, self.deps(), self.clock.clone())
    }

    /// Join a job's room and return the receiving half of the channel.
    pub fn subscribe(&self, job: &JobId, name: &str) -> mpsc::Receiver<LogEvent> {
        let (tx, rx) = mpsc::channel(128);
        self.broadcaster.join(job, SubscriberId::new(name), tx);
        rx
    }
}

/// Work items indexed 0..n.
pub fn items(n: u64) -> Vec<WorkItem> {
    (0..n).map(WorkItem::new).collect()
}

/// Drain everything currently buffered for a subscriber.
pub fn drain(rx: &mut mpsc::Receiver<LogEvent>) -> Vec<LogEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Parse a JSONL output file into JSON values, one per line.
pub fn read_jsonl(path: &std::path::Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}
