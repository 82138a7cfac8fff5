//! Workflow Orchestrator (C4): the state machine in spec §4.4.
//!
//! The orchestrator never executes an agent itself -- it hands a
//! `StepDispatch` to whatever worker pool asks for one, then reacts to
//! `record_step_success`/`record_step_failure` callbacks. This keeps the
//! orchestrator a pure state machine over the event log, with all
//! blocking I/O pushed into the worker pool (C5).

use std::collections::BTreeMap;
use std::sync::Arc;

use agentflow_types::{AgentError, Artifact, ErrorKind, Message, RetryPolicy, Task, TaskStatus};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::catalog::WorkflowCatalog;
use crate::errors::OrchestratorError;
use crate::event::{AgentEvent, AgentEventKind, EventMesh, EventStore};
use crate::hashing::hash_value;
use crate::repo::{InMemoryTaskRepository, StepStatus, TaskRepository};
use crate::store::TaskStore;

use super::dispatch::{StepDispatch, StepOutcome};

pub struct WorkflowOrchestrator<E: EventStore> {
    pub mesh: Arc<EventMesh<E>>,
    pub store: Arc<TaskStore>,
    pub catalog: WorkflowCatalog,
    repository: InMemoryTaskRepository,
}

impl<E: EventStore> WorkflowOrchestrator<E> {
    pub fn new(mesh: Arc<EventMesh<E>>, store: Arc<TaskStore>, catalog: WorkflowCatalog) -> Self {
        Self { mesh, store, catalog, repository: InMemoryTaskRepository::new() }
    }

    pub async fn submit_task(
        &self,
        task_type: &str,
        user: &str,
        context: BTreeMap<String, Value>,
        priority: i32,
    ) -> Result<Task, OrchestratorError> {
        let workflow = self
            .catalog
            .resolve(task_type)
            .ok_or_else(|| OrchestratorError::UnknownWorkflow(task_type.to_string()))?
            .to_vec();
        let mut task = Task::new(task_type, workflow.clone(), user, context);
        task.priority = priority;
        self.store.insert_task(task.clone()).await;
        self.mesh.publish(task.id, AgentEventKind::TaskCreated { workflow, user: user.to_string() }).await;
        Ok(task)
    }

    pub async fn get_task(&self, id: Uuid) -> Option<Task> {
        self.store.get_task(id).await
    }

    pub async fn list_tasks(&self, user: Option<&str>) -> Vec<Task> {
        self.store.list_tasks(user).await
    }

    pub async fn get_artifacts(&self, task_id: Uuid) -> Vec<Artifact> {
        self.store.get_artifacts(task_id).await
    }

    pub async fn get_messages(&self, task_id: Uuid) -> Vec<Message> {
        self.store.get_messages(task_id).await
    }

    pub async fn subscribe(&self, task_id: Uuid) -> broadcast::Receiver<AgentEvent> {
        self.mesh.subscribe(task_id)
    }

    /// Replays the event log to reconstruct the task's step-level state.
    pub async fn task_instance(&self, task_id: Uuid) -> Result<crate::repo::TaskInstance, OrchestratorError> {
        let task = self.store.get_task(task_id).await.ok_or(OrchestratorError::TaskNotFound)?;
        let events = self.mesh.get_events(task_id).await;
        Ok(self.repository.load(task_id, &events, &task.workflow))
    }

    /// Returns the next step ready to run, or `None` if the task is
    /// paused/terminal/already complete. Validates the target agent's
    /// declared inputs before returning a dispatch (`InvalidInput` fails
    /// the step immediately without ever reaching a worker).
    pub async fn next_dispatch(
        &self,
        task_id: Uuid,
        validate_inputs: impl FnOnce(&str, &serde_json::Map<String, Value>) -> Result<(), Vec<String>>,
    ) -> Result<Option<StepDispatch>, OrchestratorError> {
        let task = self.store.get_task(task_id).await.ok_or(OrchestratorError::TaskNotFound)?;
        if task.status.is_terminal() || task.status == TaskStatus::Paused {
            return Ok(None);
        }
        let instance = self.task_instance(task_id).await?;
        if instance.cursor >= task.workflow.len() {
            self.finish_task(task_id, &instance).await?;
            return Ok(None);
        }
        let agent_type = task.workflow[instance.cursor].clone();
        let attempt = instance.steps[instance.cursor].attempts + 1;

        let context_obj: serde_json::Map<String, Value> = task.context.clone().into_iter().collect();
        if let Err(missing) = validate_inputs(&agent_type, &context_obj) {
            let detail = format!("missing required inputs: {}", missing.join(", "));
            self.record_step_failure(
                task_id,
                instance.cursor,
                &agent_type,
                attempt,
                AgentError::invalid_input(detail),
                &RetryPolicy::default(),
            )
            .await?;
            return Ok(None);
        }

        self.mesh
            .publish(task_id, AgentEventKind::StepStarted { step_index: instance.cursor, agent_type: agent_type.clone(), attempt })
            .await;
        if task.status == TaskStatus::Pending {
            let _ = self.store.transition_task(task_id, TaskStatus::Pending, |t| t.status = TaskStatus::Running).await;
        }

        Ok(Some(StepDispatch {
            task_id,
            step_index: instance.cursor,
            agent_type,
            attempt,
            priority: task.priority,
            context: Value::Object(context_obj),
        }))
    }

    /// Called by the worker pool when an agent's `execute` returns `Ok`.
    pub async fn record_step_success(
        &self,
        task_id: Uuid,
        step_index: usize,
        agent_type: &str,
        type_tag: &str,
        data: Value,
    ) -> Result<Artifact, OrchestratorError> {
        let artifact = Artifact::new(task_id, agent_type, step_index, type_tag, data.clone());
        let artifact = self.store.append_artifact(artifact).await;

        let fp_input = serde_json::json!({
            "task_id": task_id,
            "step_index": step_index,
            "agent_type": agent_type,
            "artifact_hash": hash_value(&artifact.data),
        });
        let fingerprint = hash_value(&fp_input);

        self.mesh
            .publish(
                task_id,
                AgentEventKind::StepFinished {
                    step_index,
                    agent_type: agent_type.to_string(),
                    artifact_id: artifact.id,
                    fingerprint,
                },
            )
            .await;

        let task = self
            .store
            .transition_task(task_id, TaskStatus::Running, |t| {
                t.merge_namespaced(agent_type, &data);
                if t.current_step == step_index {
                    t.current_step += 1;
                }
            })
            .await?;

        self.mesh
            .publish(task_id, AgentEventKind::Progress { agent_type: agent_type.to_string(), content: "step completed".into(), progress: 100 })
            .await;

        if task.current_step >= task.workflow.len() {
            let instance = self.task_instance(task_id).await?;
            self.finish_task(task_id, &instance).await?;
        }

        Ok(artifact)
    }

    /// Called by the worker pool when an agent's `execute` returns `Err`,
    /// or when `next_dispatch` rejects invalid input.
    pub async fn record_step_failure(
        &self,
        task_id: Uuid,
        step_index: usize,
        agent_type: &str,
        attempt: u32,
        error: AgentError,
        policy: &RetryPolicy,
    ) -> Result<StepOutcome, OrchestratorError> {
        self.mesh
            .publish(
                task_id,
                AgentEventKind::StepFailed {
                    step_index,
                    agent_type: agent_type.to_string(),
                    attempt,
                    kind: error.kind,
                    detail: error.detail.clone(),
                },
            )
            .await;
        self.store.append_message(Message::error(task_id, agent_type, error.detail.clone())).await;

        if error.kind.is_retryable() && attempt < policy.max_attempts {
            let delay_ms = backoff_delay_ms(policy, attempt);
            self.mesh
                .publish(
                    task_id,
                    AgentEventKind::RetryScheduled { step_index, agent_type: agent_type.to_string(), retry_index: attempt, delay_ms },
                )
                .await;
            Ok(StepOutcome::Retrying { delay_ms })
        } else {
            self.store
                .transition_task(task_id, TaskStatus::Running, |t| t.status = TaskStatus::Failed)
                .await?;
            self.mesh.publish(task_id, AgentEventKind::TaskFailed { kind: error.kind, detail: error.detail }).await;
            Ok(StepOutcome::Failed)
        }
    }

    pub async fn cancel_task(&self, task_id: Uuid) -> Result<(), OrchestratorError> {
        let task = self.store.get_task(task_id).await.ok_or(OrchestratorError::TaskNotFound)?;
        if task.status.is_terminal() {
            return Err(OrchestratorError::TaskTerminal);
        }
        self.store.transition_task(task_id, task.status, |t| t.status = TaskStatus::Cancelled).await?;
        self.mesh.publish(task_id, AgentEventKind::TaskCancelled).await;
        Ok(())
    }

    pub async fn pause_task(&self, task_id: Uuid) -> Result<(), OrchestratorError> {
        self.store.transition_task(task_id, TaskStatus::Running, |t| t.status = TaskStatus::Paused).await?;
        self.mesh.publish(task_id, AgentEventKind::TaskPaused).await;
        Ok(())
    }

    pub async fn resume_task(&self, task_id: Uuid) -> Result<(), OrchestratorError> {
        self.store.transition_task(task_id, TaskStatus::Paused, |t| t.status = TaskStatus::Running).await?;
        self.mesh.publish(task_id, AgentEventKind::TaskResumed).await;
        Ok(())
    }

    async fn finish_task(&self, task_id: Uuid, instance: &crate::repo::TaskInstance) -> Result<(), OrchestratorError> {
        if instance.steps.iter().any(|s| !matches!(s.status, StepStatus::FinishedOk)) {
            return Ok(());
        }
        let fingerprints: Vec<String> = instance.steps.iter().filter_map(|s| s.fingerprint.clone()).collect();
        let flow_fingerprint = hash_value(&serde_json::json!({ "step_fingerprints": fingerprints }));
        self.store.transition_task(task_id, TaskStatus::Running, |t| t.status = TaskStatus::Completed).await?;
        self.mesh.publish(task_id, AgentEventKind::TaskCompleted { fingerprint: flow_fingerprint }).await;
        Ok(())
    }
}

/// `delay = min(initial * factor^(attempt-1) + jitter, max)`, jitter
/// uniform in [-20%, +20%] (spec §4.5). Deterministic pseudo-jitter keyed
/// on `attempt` so retries stay reproducible in tests.
fn backoff_delay_ms(policy: &RetryPolicy, attempt: u32) -> u64 {
    let base = policy.initial_delay_ms as f64 * policy.backoff_factor.powi(attempt as i32 - 1);
    let jitter_fraction = (((attempt as u64).wrapping_mul(2654435761) % 41) as f64 / 100.0) - 0.20;
    let with_jitter = base * (1.0 + jitter_fraction);
    with_jitter.clamp(0.0, policy.max_delay_ms as f64) as u64
}
