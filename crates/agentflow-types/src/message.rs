//! Message: per-task progress/completion/error records (spec §3.3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Progress,
    Completion,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub task_id: Uuid,
    pub agent_type: String,
    pub kind: MessageKind,
    pub content: String,
    /// Monotonic 0-100 progress value for the step currently running.
    pub progress: Option<u8>,
    pub metadata: Value,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn progress(task_id: Uuid, agent_type: impl Into<String>, content: impl Into<String>, progress: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            agent_type: agent_type.into(),
            kind: MessageKind::Progress,
            content: content.into(),
            progress: Some(progress),
            metadata: Value::Null,
            timestamp: Utc::now(),
        }
    }

    pub fn completion(task_id: Uuid, agent_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            agent_type: agent_type.into(),
            kind: MessageKind::Completion,
            content: content.into(),
            progress: Some(100),
            metadata: Value::Null,
            timestamp: Utc::now(),
        }
    }

    pub fn error(task_id: Uuid, agent_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            agent_type: agent_type.into(),
            kind: MessageKind::Error,
            content: content.into(),
            progress: None,
            metadata: Value::Null,
            timestamp: Utc::now(),
        }
    }
}
