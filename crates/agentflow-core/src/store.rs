//! Task Store (C2): authoritative storage of tasks, artifacts, and
//! messages. The in-memory implementation here is what `agentflow-cli`
//! and the test suites run against; `agentflow-persistence` provides the
//! Postgres-backed equivalent behind the same shape.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use agentflow_types::{Artifact, Message, Task, TaskStatus};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::OrchestratorError;

/// Bound on retained messages per task; oldest are dropped once exceeded.
const MESSAGE_RING_CAPACITY: usize = 512;

#[derive(Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
    // idempotency key: (task_id, agent_type, step_index)
    artifacts: RwLock<HashMap<(Uuid, String, usize), Artifact>>,
    messages: RwLock<HashMap<Uuid, VecDeque<Message>>>,
}

impl TaskStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn insert_task(&self, task: Task) {
        self.tasks.write().await.insert(task.id, task);
    }

    pub async fn get_task(&self, id: Uuid) -> Option<Task> {
        self.tasks.read().await.get(&id).cloned()
    }

    pub async fn list_tasks(&self, user: Option<&str>) -> Vec<Task> {
        self.tasks
            .read()
            .await
            .values()
            .filter(|t| user.map(|u| t.user == u).unwrap_or(true))
            .cloned()
            .collect()
    }

    /// Optimistic-concurrency status/step transition: fails with
    /// `ConcurrentUpdate` if `from` no longer matches the stored status.
    pub async fn transition_task<F>(&self, id: Uuid, from: TaskStatus, mutate: F) -> Result<Task, OrchestratorError>
    where
        F: FnOnce(&mut Task),
    {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(OrchestratorError::TaskNotFound)?;
        if std::mem::discriminant(&task.status) != std::mem::discriminant(&from) {
            return Err(OrchestratorError::ConcurrentUpdate);
        }
        mutate(task);
        Ok(task.clone())
    }

    /// Idempotent artifact append: a duplicate (task, agent, step) returns
    /// the artifact already on record instead of inserting a second one
    /// (spec P1).
    pub async fn append_artifact(&self, artifact: Artifact) -> Artifact {
        let key = (artifact.task_id, artifact.agent_type.clone(), artifact.step_index);
        let mut artifacts = self.artifacts.write().await;
        artifacts.entry(key).or_insert(artifact).clone()
    }

    pub async fn get_artifacts(&self, task_id: Uuid) -> Vec<Artifact> {
        let mut out: Vec<Artifact> =
            self.artifacts.read().await.values().filter(|a| a.task_id == task_id).cloned().collect();
        out.sort_by_key(|a| a.step_index);
        out
    }

    pub async fn append_message(&self, message: Message) {
        let mut messages = self.messages.write().await;
        let ring = messages.entry(message.task_id).or_default();
        ring.push_back(message);
        while ring.len() > MESSAGE_RING_CAPACITY {
            ring.pop_front();
        }
    }

    pub async fn get_messages(&self, task_id: Uuid) -> Vec<Message> {
        self.messages.read().await.get(&task_id).map(|r| r.iter().cloned().collect()).unwrap_or_default()
    }
}

/// Helper used by `create_task`: resolves a workflow catalog entry into a
/// fresh task's initial context.
pub fn empty_context() -> BTreeMap<String, serde_json::Value> {
    BTreeMap::new()
}
