//! Room streaming behavior: replay-on-join and the wire payload.

use crate::prelude::*;
use rh_adapters::FakeExecutor;
use rh_core::{JobId, JobStatus, LogEventKind};

#[tokio::test]
async fn late_joiner_sees_current_counters_immediately() {
    let engine = engine();
    let job = JobId::new("stream-1");

    // N items complete before anyone is watching
    engine
        .runner(FakeExecutor::new())
        .run(job.clone(), items(4))
        .await
        .unwrap();

    let mut rx = engine.subscribe(&job, "late");
    let events = drain(&mut rx);

    // A single synthetic event, equal to the latest stored record,
    // without waiting for item N+1
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, LogEventKind::Log);
    assert_eq!(events[0].record, engine.store.latest(&job).unwrap());
    assert_eq!(events[0].record.success_count, 4);
}

#[tokio::test]
async fn two_observers_get_independent_streams() {
    let engine = engine();
    let job = JobId::new("stream-2");

    let mut rx_a = engine.subscribe(&job, "a");
    let mut rx_b = engine.subscribe(&job, "b");

    engine
        .runner(FakeExecutor::new())
        .run(job.clone(), items(2))
        .await
        .unwrap();

    let events_a = drain(&mut rx_a);
    let events_b = drain(&mut rx_b);

    // Same stream for both (replay + per-item + finalizing + terminal)
    assert_eq!(events_a.len(), events_b.len());
    assert_eq!(events_a.last().unwrap().kind, LogEventKind::Terminal);
    assert_eq!(events_b.last().unwrap().kind, LogEventKind::Terminal);
}

#[tokio::test]
async fn leaving_stops_delivery_without_affecting_others() {
    let engine = engine();
    let job = JobId::new("stream-3");

    let mut rx_stay = engine.subscribe(&job, "stay");
    let mut rx_leave = engine.subscribe(&job, "leave");
    drain(&mut rx_stay);
    drain(&mut rx_leave);

    engine
        .broadcaster
        .leave(&job, &rh_engine::SubscriberId::new("leave"));

    engine
        .runner(FakeExecutor::new())
        .run(job.clone(), items(1))
        .await
        .unwrap();

    assert!(drain(&mut rx_leave).is_empty());
    assert!(!drain(&mut rx_stay).is_empty());
}

#[tokio::test]
async fn wire_payload_has_the_documented_shape() {
    let engine = engine();
    let job = JobId::new("stream-4");
    let mut rx = engine.subscribe(&job, "observer");

    engine
        .runner(FakeExecutor::new())
        .run(job.clone(), items(1))
        .await
        .unwrap();

    let terminal = drain(&mut rx)
        .into_iter()
        .find(|e| e.kind == LogEventKind::Terminal)
        .unwrap();
    let json = serde_json::to_value(&terminal).unwrap();

    assert_eq!(json["jobID"], "stream-4");
    assert_eq!(json["position"], 0);
    assert_eq!(json["total"], 1);
    assert_eq!(json["remaining"], 0);
    assert_eq!(json["successCount"], 1);
    assert_eq!(json["errorCount"], 0);
    assert_eq!(json["status"], "finished");
    assert_eq!(json["type"], "terminal");
    assert!(json["message"].as_str().unwrap().contains("finished in"));
    // ISO-8601 timestamp
    let ts = json["timestamp"].as_str().unwrap();
    assert!(ts.ends_with('Z') && ts.contains('T'), "timestamp: {ts}");
}

#[tokio::test]
async fn terminal_status_wire_names() {
    // Finalizing serializes as "finishing" per the wire contract
    assert_eq!(
        serde_json::to_value(JobStatus::Finalizing).unwrap(),
        "finishing"
    );
}
