use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentflow_core::{QueueWatermarks, StepDispatch};
use agentflow_registry::AgentRegistry;
use agentflow_types::{AgentError, AgentStatus, CapabilityCard, PortSchema};
use agentflow_workers::{Agent, AgentOutput, AgentTaskView, CancellationToken, PoolManager, WorkerPool};
use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

struct RecordingAgent {
    order: Mutex<Vec<Uuid>>,
    active: AtomicUsize,
    max_seen_active: AtomicUsize,
}

#[async_trait]
impl Agent for RecordingAgent {
    fn agent_type(&self) -> &str {
        "enrichment"
    }

    async fn execute(&self, view: AgentTaskView, _cancel: CancellationToken) -> Result<AgentOutput, AgentError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen_active.fetch_max(now_active, Ordering::SeqCst);
        self.order.lock().unwrap().push(view.task_id);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(AgentOutput { type_tag: "ok".into(), data: json!({}), progress: vec![] })
    }
}

fn dispatch(task_id: Uuid, priority: i32) -> StepDispatch {
    StepDispatch { task_id, step_index: 0, agent_type: "enrichment".into(), attempt: 1, priority, context: json!({}) }
}

#[tokio::test]
async fn never_exceeds_configured_concurrency() {
    let agent = Arc::new(RecordingAgent { order: Mutex::new(vec![]), active: AtomicUsize::new(0), max_seen_active: AtomicUsize::new(0) });
    let (pool, mut rx) = WorkerPool::new(agent.clone(), 2, Duration::from_secs(5), 1000, Duration::from_secs(60));

    for _ in 0..5 {
        pool.enqueue(dispatch(Uuid::new_v4(), 0)).await;
    }

    let mut seen = 0;
    while seen < 5 {
        rx.recv().await.expect("job result");
        seen += 1;
    }

    assert!(agent.max_seen_active.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn higher_priority_task_dispatches_first_when_queued_together() {
    let agent = Arc::new(RecordingAgent { order: Mutex::new(vec![]), active: AtomicUsize::new(0), max_seen_active: AtomicUsize::new(0) });
    // concurrency 1 so dispatch order is fully deterministic.
    let (pool, mut rx) = WorkerPool::new(agent.clone(), 1, Duration::from_secs(5), 1000, Duration::from_secs(60));

    let low_a = Uuid::new_v4();
    let high = Uuid::new_v4();
    let low_b = Uuid::new_v4();

    // Enqueue the first job and wait for it to actually start so the
    // remaining two are queued together under contention.
    pool.enqueue(dispatch(low_a, 0)).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    pool.enqueue(dispatch(high, 5)).await;
    pool.enqueue(dispatch(low_b, 0)).await;

    for _ in 0..3 {
        rx.recv().await.expect("job result");
    }

    let order = agent.order.lock().unwrap().clone();
    assert_eq!(order, vec![low_a, high, low_b]);
}

struct StallingAgent;

#[async_trait]
impl Agent for StallingAgent {
    fn agent_type(&self) -> &str {
        "enrichment"
    }

    async fn execute(&self, _view: AgentTaskView, _cancel: CancellationToken) -> Result<AgentOutput, AgentError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(AgentOutput { type_tag: "ok".into(), data: json!({}), progress: vec![] })
    }
}

fn card() -> CapabilityCard {
    CapabilityCard {
        agent_type: "enrichment".into(),
        version: "1.0".into(),
        description: "test agent".into(),
        inputs: vec![PortSchema { name: "x".into(), value_type: "string".into(), required: true }],
        output_type_tag: "enrichment.result".into(),
        concurrency_limit: 1,
        protocols: vec!["json".into()],
        status: AgentStatus::Active,
        default_timeout_ms: 60_000,
    }
}

#[tokio::test]
async fn queue_depth_past_high_water_drains_the_agent_in_the_registry() {
    let (pool, _rx) = WorkerPool::new(Arc::new(StallingAgent), 1, Duration::from_secs(60), 1000, Duration::from_secs(60));
    let manager = PoolManager::new();
    manager.insert(pool);

    let registry = AgentRegistry::new();
    registry.register(card());

    // one job occupies the only permit, the rest pile up as `waiting`.
    for _ in 0..5 {
        manager.enqueue(dispatch(Uuid::new_v4(), 0)).await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    manager.enforce_backpressure(&registry, QueueWatermarks { high_water: 2, low_water: 1 });
    assert_eq!(registry.resolve("enrichment").unwrap().status, AgentStatus::Draining);
}
