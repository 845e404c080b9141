// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Room-scoped event broadcasting.
//!
//! A room corresponds to one job id. Subscribers register an mpsc sender
//! handle; publishing never blocks and never fails the caller: a slow
//! subscriber loses events, a disconnected subscriber is pruned.

use parking_lot::Mutex;
use rh_core::{Clock, JobId, LogEvent, LogEventKind, ProgressRecord};
use rh_storage::{CancelFlags, ProgressStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

rh_core::define_id! {
    /// Identifies one subscriber within a room (e.g. a transport
    /// connection id).
    pub struct SubscriberId;
}

type Room = HashMap<SubscriberId, mpsc::Sender<LogEvent>>;

/// Shared, multi-tenant fan-out of job progress events.
pub struct EventBroadcaster<C: Clock> {
    rooms: Mutex<HashMap<String, Room>>,
    store: Arc<ProgressStore>,
    flags: Arc<CancelFlags>,
    clock: C,
}

impl<C: Clock> EventBroadcaster<C> {
    pub fn new(store: Arc<ProgressStore>, flags: Arc<CancelFlags>, clock: C) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            store,
            flags,
            clock,
        }
    }

    /// Add a subscriber to a job's room and immediately replay the last
    /// known counters to it (and only it), so a client that connects
    /// mid-job does not wait for the next item to see state.
    pub fn join(&self, job_id: &JobId, subscriber_id: SubscriberId, tx: mpsc::Sender<LogEvent>) {
        let record = self
            .store
            .latest(job_id)
            .unwrap_or_else(|| ProgressRecord::initial(job_id.clone(), 0));
        let replay = LogEvent::new(record, LogEventKind::Log, self.clock.epoch_ms());

        if let Err(e) = tx.try_send(replay) {
            warn!(
                job_id = %job_id,
                subscriber = %subscriber_id,
                error = %e,
                "replay-on-join delivery failed"
            );
        }

        debug!(job_id = %job_id, subscriber = %subscriber_id, "subscriber joined");
        self.rooms
            .lock()
            .entry(job_id.as_str().to_string())
            .or_default()
            .insert(subscriber_id, tx);
    }

    /// Remove a subscriber from a job's room. No error if already absent.
    pub fn leave(&self, job_id: &JobId, subscriber_id: &SubscriberId) {
        let mut rooms = self.rooms.lock();
        if let Some(room) = rooms.get_mut(job_id.as_str()) {
            room.remove(subscriber_id);
            if room.is_empty() {
                rooms.remove(job_id.as_str());
            }
        }
    }

    /// Deliver an event to every subscriber currently in the job's room.
    ///
    /// Best-effort: a full subscriber channel drops this event for that
    /// subscriber only; a closed channel (transport disconnect) removes
    /// the subscriber from the room.
    pub fn publish(&self, event: LogEvent) {
        let mut rooms = self.rooms.lock();
        let Some(room) = rooms.get_mut(event.job_id().as_str()) else {
            return;
        };

        let mut gone: Vec<SubscriberId> = Vec::new();
        for (subscriber_id, tx) in room.iter() {
            match tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        job_id = %event.job_id(),
                        subscriber = %subscriber_id,
                        "subscriber channel full, dropping event"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    gone.push(subscriber_id.clone());
                }
            }
        }

        for subscriber_id in gone {
            debug!(
                job_id = %event.job_id(),
                subscriber = %subscriber_id,
                "subscriber disconnected, removing from room"
            );
            room.remove(&subscriber_id);
        }
    }

    /// Request that a job stop at its next item boundary.
    ///
    /// Sets the durable cancellation flag and publishes an informational
    /// event; the terminal event still comes from the runner when it
    /// actually stops.
    pub fn request_stop(&self, job_id: &JobId) {
        if let Err(e) = self.flags.request_cancel(job_id) {
            // In-memory flag is still set; a runner in this process will
            // observe the request even though the durable write failed.
            warn!(job_id = %job_id, error = %e, "failed to persist cancellation flag");
        }
        info!(job_id = %job_id, "stop requested");

        let mut record = self
            .store
            .latest(job_id)
            .unwrap_or_else(|| ProgressRecord::initial(job_id.clone(), 0));
        record.message = "stop requested; finishing current item".to_string();
        self.publish(LogEvent::new(
            record,
            LogEventKind::Log,
            self.clock.epoch_ms(),
        ));
    }

    /// Archive a terminal job: drop its room, clear its cancellation
    /// flag, and remove its progress records.
    pub fn archive(&self, job_id: &JobId) {
        self.rooms.lock().remove(job_id.as_str());
        self.flags.clear(job_id);
        self.store.archive(job_id);
    }

    /// Number of subscribers currently in a job's room.
    pub fn subscriber_count(&self, job_id: &JobId) -> usize {
        self.rooms
            .lock()
            .get(job_id.as_str())
            .map(Room::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "broadcast_tests.rs"]
mod tests;
