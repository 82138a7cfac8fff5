//! Event Mesh (C1): durable per-stream ordering plus live consumer-group
//! delivery.
//!
//! A stream is keyed by task id. Durable storage is any `EventStore`;
//! live delivery to subscribers is a `tokio::sync::broadcast` channel per
//! stream, created lazily on first subscribe. This mirrors the
//! append-only, replay-friendly event log this substrate's engine already
//! relies on for state reconstruction -- the mesh just also fans the same
//! events out live.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AgentEvent, AgentEventKind, EventStore};

const CHANNEL_CAPACITY: usize = 1024;

/// A consumer-group filter (spec §4.1): event type set, source (agent
/// type) set, and an arbitrary payload predicate. All three narrow the
/// match; an unset field imposes no constraint.
#[derive(Clone, Default)]
pub struct EventFilter {
    pub type_names: Option<HashSet<&'static str>>,
    pub sources: Option<HashSet<String>>,
    pub predicate: Option<Arc<dyn Fn(&AgentEvent) -> bool + Send + Sync>>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of_types(type_names: impl IntoIterator<Item = &'static str>) -> Self {
        Self { type_names: Some(type_names.into_iter().collect()), ..Self::default() }
    }

    pub fn from_sources(sources: impl IntoIterator<Item = String>) -> Self {
        Self { sources: Some(sources.into_iter().collect()), ..Self::default() }
    }

    pub fn matches(&self, event: &AgentEvent) -> bool {
        if let Some(type_names) = &self.type_names {
            if !type_names.contains(event.kind.type_name()) {
                return false;
            }
        }
        if let Some(sources) = &self.sources {
            match event.kind.source() {
                Some(source) if sources.contains(source) => {}
                _ => return false,
            }
        }
        if let Some(predicate) = &self.predicate {
            if !predicate(event) {
                return false;
            }
        }
        true
    }
}

pub struct EventMesh<E: EventStore> {
    store: Arc<Mutex<E>>,
    channels: DashMap<Uuid, broadcast::Sender<AgentEvent>>,
    /// Per-(stream, consumer group) acknowledgement cursor: the `seq` of
    /// the last event delivered to that group on that stream.
    group_cursors: DashMap<(Uuid, String), u64>,
}

impl<E: EventStore> EventMesh<E> {
    pub fn new(store: E) -> Self {
        Self { store: Arc::new(Mutex::new(store)), channels: DashMap::new(), group_cursors: DashMap::new() }
    }

    fn channel_for(&self, stream_id: Uuid) -> broadcast::Sender<AgentEvent> {
        self.channels
            .entry(stream_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Append `kind` to the durable log for `stream_id` and fan it out to
    /// any live subscribers. Returns the persisted event (with its
    /// assigned `seq`).
    pub async fn publish(&self, stream_id: Uuid, kind: AgentEventKind) -> AgentEvent {
        let ev = {
            let mut store = self.store.lock().await;
            store.append_kind(stream_id, kind)
        };
        // A send error just means there are currently no subscribers; the
        // event is still durable and replayable via `get_events`.
        let _ = self.channel_for(stream_id).send(ev.clone());
        ev
    }

    /// Subscribe to the live stream for `stream_id`. The caller receives
    /// every event published from this point forward until the task
    /// reaches a terminal state and the sender side is dropped.
    pub fn subscribe(&self, stream_id: Uuid) -> broadcast::Receiver<AgentEvent> {
        self.channel_for(stream_id).subscribe()
    }

    /// Historical query: every event recorded for `stream_id`, in order.
    pub async fn get_events(&self, stream_id: Uuid) -> Vec<AgentEvent> {
        self.store.lock().await.list(stream_id)
    }

    /// The `seq` of the last event acknowledged by `group` on `stream_id`,
    /// or 0 if the group has never consumed anything from this stream.
    pub fn group_cursor(&self, stream_id: Uuid, group: &str) -> u64 {
        self.group_cursors.get(&(stream_id, group.to_string())).map(|c| *c).unwrap_or(0)
    }
}

impl<E: EventStore + Send + Sync + 'static> EventMesh<E> {
    /// Registers consumer group `group` against `stream_id` (spec §4.1):
    /// replays every durable event past the group's current cursor that
    /// matches `filter` to `handler`, then keeps delivering live events
    /// the same way. The cursor only advances past an event once
    /// `handler` has returned for it, which is what gives the group
    /// at-least-once delivery -- a group that never re-subscribes simply
    /// stops advancing, but one that resumes picks up exactly where it
    /// left off instead of replaying the whole stream or losing events.
    ///
    /// Returns a `JoinHandle` the caller can abort to stop the group;
    /// the task otherwise runs until the stream's broadcast sender is
    /// dropped.
    pub fn subscribe_group<H>(
        self: &Arc<Self>,
        group: impl Into<String>,
        stream_id: Uuid,
        filter: EventFilter,
        mut handler: H,
    ) -> tokio::task::JoinHandle<()>
    where
        H: FnMut(&AgentEvent) + Send + 'static,
    {
        let group = group.into();
        let mesh = Arc::clone(self);
        tokio::spawn(async move {
            let mut live = mesh.subscribe(stream_id);
            for event in mesh.get_events(stream_id).await {
                mesh.deliver_if_new(&group, &filter, &event, &mut handler);
            }
            loop {
                match live.recv().await {
                    Ok(event) => mesh.deliver_if_new(&group, &filter, &event, &mut handler),
                    Err(broadcast::error::RecvError::Closed) => break,
                    // A lagging group skipped some live events; the next
                    // `get_events` catch-up (on a future resubscribe)
                    // would replay them, but within one subscription we
                    // just keep going rather than stall the group.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        })
    }

    fn deliver_if_new<H>(&self, group: &str, filter: &EventFilter, event: &AgentEvent, handler: &mut H)
    where
        H: FnMut(&AgentEvent),
    {
        if event.seq < self.group_cursor(event.stream_id, group) {
            return;
        }
        if filter.matches(event) {
            handler(event);
        }
        self.group_cursors.insert((event.stream_id, group.to_string()), event.seq + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::InMemoryEventStore;
    use std::sync::Mutex as StdMutex;

    #[tokio::test]
    async fn subscribe_group_only_delivers_events_matching_the_filter() {
        let mesh = Arc::new(EventMesh::new(InMemoryEventStore::new()));
        let stream_id = Uuid::new_v4();
        mesh.publish(stream_id, AgentEventKind::TaskCreated { workflow: vec!["import".into()], user: "alice".into() }).await;
        mesh.publish(stream_id, AgentEventKind::StepStarted { step_index: 0, agent_type: "import".into(), attempt: 1 }).await;
        mesh.publish(stream_id, AgentEventKind::StepFailed { step_index: 0, agent_type: "import".into(), attempt: 1, kind: agentflow_types::ErrorKind::Transient, detail: "boom".into() }).await;

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let filter = EventFilter::of_types(["StepStarted", "StepFailed"]);
        let handle = mesh.subscribe_group("watchers", stream_id, filter, move |event| {
            seen_clone.lock().unwrap().push(event.kind.type_name());
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        handle.abort();

        assert_eq!(*seen.lock().unwrap(), vec!["StepStarted", "StepFailed"]);
    }

    #[tokio::test]
    async fn group_cursor_advances_past_delivered_events() {
        let mesh = Arc::new(EventMesh::new(InMemoryEventStore::new()));
        let stream_id = Uuid::new_v4();
        mesh.publish(stream_id, AgentEventKind::TaskCreated { workflow: vec![], user: "bob".into() }).await;
        mesh.publish(stream_id, AgentEventKind::TaskCompleted { fingerprint: "f".into() }).await;

        let handle = mesh.subscribe_group("archiver", stream_id, EventFilter::all(), |_| {});
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        handle.abort();

        assert_eq!(mesh.group_cursor(stream_id, "archiver"), 2);
    }
}
