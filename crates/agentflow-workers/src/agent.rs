//! The agent contract (spec §6.3), implemented by collaborators outside
//! this core (concrete import/enrichment/AI-provider logic lives in
//! `agentflow-providers` or further out); this crate only needs the
//! trait to invoke it from within a bounded-concurrency pool.

use agentflow_types::AgentError;
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::cancel::CancellationToken;

#[derive(Debug, Clone)]
pub struct AgentTaskView {
    pub task_id: Uuid,
    pub step_index: usize,
    pub attempt: u32,
    pub context: Value,
}

#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub type_tag: String,
    pub data: Value,
    /// Progress messages the agent wants surfaced while it runs;
    /// `u8` is the cumulative 0-100 progress value (must be
    /// non-decreasing, spec P3).
    pub progress: Vec<(String, u8)>,
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn agent_type(&self) -> &str;

    /// Must be deterministic with respect to `view.context` so that
    /// retries converge to the same artifact (spec §6.3). Must check
    /// `cancel.is_cancelled()` at every I/O boundary.
    async fn execute(&self, view: AgentTaskView, cancel: CancellationToken) -> Result<AgentOutput, AgentError>;
}
