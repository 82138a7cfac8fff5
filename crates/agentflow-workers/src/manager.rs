//! A named collection of pools, one per registered agent type, plus the
//! retry-delay scheduler that re-enqueues a failed step after the
//! orchestrator's computed backoff.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use agentflow_core::{QueueWatermarks, StepDispatch};
use agentflow_registry::AgentRegistry;
use agentflow_types::AgentStatus;
use dashmap::DashMap;

use crate::pool::WorkerPool;

#[derive(Default)]
pub struct PoolManager {
    pools: DashMap<String, Arc<WorkerPool>>,
}

impl PoolManager {
    pub fn new() -> Self {
        Self { pools: DashMap::new() }
    }

    pub fn insert(&self, pool: Arc<WorkerPool>) {
        self.pools.insert(pool.agent_type.clone(), pool);
    }

    pub fn get(&self, agent_type: &str) -> Option<Arc<WorkerPool>> {
        self.pools.get(agent_type).map(|p| p.clone())
    }

    pub async fn enqueue(&self, dispatch: StepDispatch) -> bool {
        match self.get(&dispatch.agent_type) {
            Some(pool) => {
                pool.enqueue(dispatch).await;
                true
            }
            None => false,
        }
    }

    pub fn cancel_task(&self, task_id: uuid::Uuid) {
        for entry in self.pools.iter() {
            entry.value().cancel(task_id);
        }
    }

    /// Checks each pool's `waiting` depth against `watermarks` and marks
    /// the agent `draining`/`active` in `registry` accordingly (spec
    /// §4.5/§5). Draining agents are skipped by the orchestrator's
    /// dispatch validation until their queue drains back below
    /// `low_water`. Call periodically (the CLI demo calls it once per
    /// dispatch-loop iteration); this never touches in-flight jobs.
    pub fn enforce_backpressure(&self, registry: &AgentRegistry, watermarks: QueueWatermarks) {
        for entry in self.pools.iter() {
            let pool = entry.value();
            let waiting = pool.stats.waiting.load(Ordering::Relaxed);
            let current = registry.resolve(&pool.agent_type).map(|c| c.status);
            if waiting > watermarks.high_water && current == Some(AgentStatus::Active) {
                registry.set_status(&pool.agent_type, AgentStatus::Draining);
            } else if waiting < watermarks.low_water && current == Some(AgentStatus::Draining) {
                registry.set_status(&pool.agent_type, AgentStatus::Active);
            }
        }
    }
}

/// Spawns a delayed re-enqueue of `dispatch` onto `manager` after
/// `delay_ms`, the way the orchestrator's retry policy prescribes.
pub fn schedule_retry(manager: Arc<PoolManager>, dispatch: StepDispatch, delay_ms: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        manager.enqueue(dispatch).await;
    });
}
