//! Dispatch descriptor handed from the orchestrator to the worker pool.

use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StepDispatch {
    pub task_id: Uuid,
    pub step_index: usize,
    pub agent_type: String,
    pub attempt: u32,
    pub priority: i32,
    /// Snapshot of the task's context at dispatch time, as a JSON object.
    pub context: Value,
}

#[derive(Debug, Clone)]
pub enum StepOutcome {
    Retrying { delay_ms: u64 },
    Failed,
}
