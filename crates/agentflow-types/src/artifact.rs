//! Artifact: immutable per-step output (spec §3.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Uuid,
    pub task_id: Uuid,
    pub agent_type: String,
    pub step_index: usize,
    pub type_tag: String,
    pub mime_type: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(task_id: Uuid, agent_type: impl Into<String>, step_index: usize, type_tag: impl Into<String>, data: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            agent_type: agent_type.into(),
            step_index,
            type_tag: type_tag.into(),
            mime_type: "application/json".to_string(),
            data,
            created_at: Utc::now(),
        }
    }
}
