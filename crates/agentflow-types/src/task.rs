//! Task: the unit of orchestration state (spec §3.1).
//!
//! A task carries its workflow (an ordered agent-type sequence), its
//! current position in that sequence, and a context map that accumulates
//! namespaced outputs from each completed step.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }
}

/// Retry/backoff policy attached to a single workflow step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, initial_delay_ms: 100, backoff_factor: 2.0, max_delay_ms: 30_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub task_type: String,
    pub status: TaskStatus,
    pub user: String,
    pub workflow: Vec<String>,
    pub current_step: usize,
    pub priority: i32,
    /// Namespaced context: keys look like `<agent_type>.<field>`.
    pub context: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub causation_id: Option<Uuid>,
}

impl Task {
    pub fn new(task_type: impl Into<String>, workflow: Vec<String>, user: impl Into<String>, context: BTreeMap<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            task_type: task_type.into(),
            status: TaskStatus::Pending,
            user: user.into(),
            workflow,
            current_step: 0,
            priority: 0,
            context,
            created_at: now,
            updated_at: now,
            correlation_id: None,
            causation_id: None,
        }
    }

    pub fn current_agent(&self) -> Option<&str> {
        self.workflow.get(self.current_step).map(|s| s.as_str())
    }

    pub fn total_steps(&self) -> usize {
        self.workflow.len()
    }

    /// Merge an agent's output fields into the task context under its
    /// namespace. Never overwrites another agent's keys.
    pub fn merge_namespaced(&mut self, agent_type: &str, data: &Value) {
        if let Value::Object(map) = data {
            for (k, v) in map {
                self.context.insert(format!("{agent_type}.{k}"), v.clone());
            }
        } else {
            self.context.insert(format!("{agent_type}.output"), data.clone());
        }
        self.updated_at = Utc::now();
    }
}
