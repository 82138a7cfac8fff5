//! Event types flowing through the mesh (spec §3.5).
//!
//! Every orchestrator state transition and every operational/learning
//! signal becomes one `AgentEventKind` variant. Events are append-only and
//! ordered per stream (a stream is keyed by task id); replaying them
//! through `TaskRepository` reconstructs task state without mutation.

use agentflow_types::ErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AgentEventKind {
    // --- lifecycle ---
    TaskCreated { workflow: Vec<String>, user: String },
    StepStarted { step_index: usize, agent_type: String, attempt: u32 },
    StepFinished { step_index: usize, agent_type: String, artifact_id: Uuid, fingerprint: String },
    StepFailed { step_index: usize, agent_type: String, attempt: u32, kind: ErrorKind, detail: String },
    RetryScheduled { step_index: usize, agent_type: String, retry_index: u32, delay_ms: u64 },
    TaskPaused,
    TaskResumed,
    TaskCancelled,
    TaskCompleted { fingerprint: String },
    TaskFailed { kind: ErrorKind, detail: String },

    // --- operational ---
    AgentRegistered { agent_type: String, version: String },
    AgentStatusChanged { agent_type: String, status: String },
    QueueBackpressureEngaged { agent_type: String, waiting: usize },
    QueueBackpressureCleared { agent_type: String },
    CircuitOpened { agent_type: String },
    CircuitClosed { agent_type: String },

    // --- learning ---
    ProblemRecorded { problem_id: Uuid, fingerprint: String, occurrence_count: u64 },
    SolutionOutcomeRecorded { solution_id: Uuid, success: bool, success_rate: f64 },
    PatternEvolved { pattern_id: Uuid, predecessor_id: Option<Uuid>, confidence: f64 },

    // --- progress (surfaced directly to SSE-style subscribers) ---
    Progress { agent_type: String, content: String, progress: u8 },
}

impl AgentEventKind {
    /// Stable type name used by consumer-group filters (spec §4.1
    /// "event type set"). Matches the variant name.
    pub fn type_name(&self) -> &'static str {
        match self {
            AgentEventKind::TaskCreated { .. } => "TaskCreated",
            AgentEventKind::StepStarted { .. } => "StepStarted",
            AgentEventKind::StepFinished { .. } => "StepFinished",
            AgentEventKind::StepFailed { .. } => "StepFailed",
            AgentEventKind::RetryScheduled { .. } => "RetryScheduled",
            AgentEventKind::TaskPaused => "TaskPaused",
            AgentEventKind::TaskResumed => "TaskResumed",
            AgentEventKind::TaskCancelled => "TaskCancelled",
            AgentEventKind::TaskCompleted { .. } => "TaskCompleted",
            AgentEventKind::TaskFailed { .. } => "TaskFailed",
            AgentEventKind::AgentRegistered { .. } => "AgentRegistered",
            AgentEventKind::AgentStatusChanged { .. } => "AgentStatusChanged",
            AgentEventKind::QueueBackpressureEngaged { .. } => "QueueBackpressureEngaged",
            AgentEventKind::QueueBackpressureCleared { .. } => "QueueBackpressureCleared",
            AgentEventKind::CircuitOpened { .. } => "CircuitOpened",
            AgentEventKind::CircuitClosed { .. } => "CircuitClosed",
            AgentEventKind::ProblemRecorded { .. } => "ProblemRecorded",
            AgentEventKind::SolutionOutcomeRecorded { .. } => "SolutionOutcomeRecorded",
            AgentEventKind::PatternEvolved { .. } => "PatternEvolved",
            AgentEventKind::Progress { .. } => "Progress",
        }
    }

    /// The originating agent type, when this variant carries one (spec
    /// §4.1 "source set"). Lifecycle events with no single agent behind
    /// them (`TaskCreated`, `TaskPaused`, ...) have no source.
    pub fn source(&self) -> Option<&str> {
        match self {
            AgentEventKind::StepStarted { agent_type, .. }
            | AgentEventKind::StepFinished { agent_type, .. }
            | AgentEventKind::StepFailed { agent_type, .. }
            | AgentEventKind::RetryScheduled { agent_type, .. }
            | AgentEventKind::AgentRegistered { agent_type, .. }
            | AgentEventKind::AgentStatusChanged { agent_type, .. }
            | AgentEventKind::QueueBackpressureEngaged { agent_type, .. }
            | AgentEventKind::QueueBackpressureCleared { agent_type, .. }
            | AgentEventKind::CircuitOpened { agent_type, .. }
            | AgentEventKind::CircuitClosed { agent_type, .. }
            | AgentEventKind::Progress { agent_type, .. } => Some(agent_type.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    pub seq: u64,
    pub stream_id: Uuid,
    pub kind: AgentEventKind,
    pub ts: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
}
