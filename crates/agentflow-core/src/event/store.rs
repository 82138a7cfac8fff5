//! Append-only event storage, keyed by stream (task id).
//!
//! `EventStore` is the durable log; `EventMesh` (see `mesh.rs`) layers
//! live consumer-group delivery on top of it via broadcast channels. A
//! Postgres-backed `EventStore` plugs in without either the orchestrator
//! or the mesh noticing.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::{AgentEvent, AgentEventKind};

pub trait EventStore: Send + Sync {
    fn append_kind(&mut self, stream_id: Uuid, kind: AgentEventKind) -> AgentEvent;
    fn list(&self, stream_id: Uuid) -> Vec<AgentEvent>;
}

#[derive(Default)]
pub struct InMemoryEventStore {
    pub inner: HashMap<Uuid, Vec<AgentEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self { inner: HashMap::new() }
    }

    pub fn len_for(&self, stream_id: Uuid) -> usize {
        self.inner.get(&stream_id).map(|v| v.len()).unwrap_or(0)
    }
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, stream_id: Uuid, kind: AgentEventKind) -> AgentEvent {
        let vec = self.inner.entry(stream_id).or_default();
        let seq = vec.len() as u64;
        let ev = AgentEvent { seq, stream_id, kind, ts: Utc::now(), correlation_id: None };
        vec.push(ev.clone());
        ev
    }

    fn list(&self, stream_id: Uuid) -> Vec<AgentEvent> {
        self.inner.get(&stream_id).cloned().unwrap_or_default()
    }
}
