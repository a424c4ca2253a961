//! Process-wide event fan-out: at most one live subscriber per job.
//!
//! Modeled as a single concrete type with register/publish/complete
//! operations over a concurrent map, per the re-architecture guidance —
//! no reflection, no runtime type discovery, just a `DashMap` keyed by
//! `job_id` holding a bounded channel sender.

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Channel capacity per subscriber. A full channel means a slow subscriber;
/// `publish` degrades to a dropped event rather than blocking the aggregator.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    JobCreated,
    Progress,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub payload: serde_json::Value,
}

/// Concurrent map from `job_id` to the sender half of that job's live
/// stream. Reads (publish/complete) and writes (subscribe) can interleave
/// without external locking.
#[derive(Default)]
pub struct EventBus {
    streams: DashMap<Uuid, mpsc::Sender<ServerEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber for `job_id`, returning the receiver half
    /// to be turned into an SSE response. A prior subscriber for the same
    /// job is evicted: dropping its sender immediately ends its stream,
    /// rather than leaving it to time out.
    pub fn subscribe(&self, job_id: Uuid) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        self.streams.insert(job_id, tx);
        rx
    }

    /// Best-effort publish. Missing subscribers and full channels are
    /// silently dropped — never fatal to job progress.
    pub fn publish(&self, job_id: Uuid, event_type: EventType, payload: serde_json::Value) {
        if let Some(entry) = self.streams.get(&job_id) {
            let _ = entry.try_send(ServerEvent {
                event_type,
                payload,
            });
        }
    }

    /// Close the stream for `job_id` cleanly and remove it from the map.
    pub fn complete(&self, job_id: Uuid) {
        self.streams.remove(&job_id);
    }
}
