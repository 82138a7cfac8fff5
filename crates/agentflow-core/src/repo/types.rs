//! Task state reconstruction from the event log (replay), the Task
//! Store's (C2) in-memory read model.

use agentflow_types::TaskStatus;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::event::{AgentEvent, AgentEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    FinishedOk,
    Failed,
}

#[derive(Debug, Clone)]
pub struct StepSlot {
    pub agent_type: String,
    pub status: StepStatus,
    pub fingerprint: Option<String>,
    pub artifact_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub attempts: u32,
    pub retry_count: u32,
}

#[derive(Debug, Clone)]
pub struct TaskInstance {
    pub id: Uuid,
    pub steps: Vec<StepSlot>,
    pub cursor: usize,
    pub status: TaskStatus,
}

/// Reconstructs `TaskInstance` by replaying the append-only event log for
/// a task against its workflow (ordered agent-type sequence).
pub trait TaskRepository: Send + Sync {
    fn load(&self, task_id: Uuid, events: &[AgentEvent], workflow: &[String]) -> TaskInstance;
}

#[derive(Default)]
pub struct InMemoryTaskRepository;

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn load(&self, task_id: Uuid, events: &[AgentEvent], workflow: &[String]) -> TaskInstance {
        let mut steps: Vec<StepSlot> = workflow
            .iter()
            .map(|agent_type| StepSlot {
                agent_type: agent_type.clone(),
                status: StepStatus::Pending,
                fingerprint: None,
                artifact_id: None,
                started_at: None,
                finished_at: None,
                attempts: 0,
                retry_count: 0,
            })
            .collect();
        let mut status = TaskStatus::Pending;

        for ev in events {
            match &ev.kind {
                AgentEventKind::TaskCreated { .. } => {}
                AgentEventKind::StepStarted { step_index, .. } => {
                    status = TaskStatus::Running;
                    if let Some(slot) = steps.get_mut(*step_index) {
                        slot.status = StepStatus::Running;
                        slot.started_at = Some(ev.ts);
                        slot.attempts += 1;
                    }
                }
                AgentEventKind::StepFinished { step_index, artifact_id, fingerprint, .. } => {
                    if let Some(slot) = steps.get_mut(*step_index) {
                        slot.status = StepStatus::FinishedOk;
                        slot.artifact_id = Some(*artifact_id);
                        slot.fingerprint = Some(fingerprint.clone());
                        slot.finished_at = Some(ev.ts);
                    }
                }
                AgentEventKind::StepFailed { step_index, .. } => {
                    if let Some(slot) = steps.get_mut(*step_index) {
                        slot.status = StepStatus::Failed;
                        slot.finished_at = Some(ev.ts);
                    }
                }
                AgentEventKind::RetryScheduled { step_index, retry_index, .. } => {
                    if let Some(slot) = steps.get_mut(*step_index) {
                        if matches!(slot.status, StepStatus::Failed) && *retry_index == slot.retry_count + 1 {
                            slot.retry_count = *retry_index;
                            slot.status = StepStatus::Pending;
                        }
                    }
                }
                AgentEventKind::TaskPaused => status = TaskStatus::Paused,
                AgentEventKind::TaskResumed => status = TaskStatus::Running,
                AgentEventKind::TaskCancelled => status = TaskStatus::Cancelled,
                AgentEventKind::TaskCompleted { .. } => status = TaskStatus::Completed,
                AgentEventKind::TaskFailed { .. } => status = TaskStatus::Failed,
                _ => {}
            }
        }

        let cursor = steps.iter().position(|s| matches!(s.status, StepStatus::Pending)).unwrap_or(steps.len());
        TaskInstance { id: task_id, steps, cursor, status }
    }
}
