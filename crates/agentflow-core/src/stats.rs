//! Plain atomic counters for orchestrator observability (spec §6.5) --
//! the same no-metrics-crate idiom `agentflow_workers::stats` uses for
//! pool counters.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::event::AgentEventKind;

#[derive(Default)]
pub struct OrchestratorStats {
    pub tasks_created: AtomicU64,
    pub tasks_completed: AtomicU64,
    pub tasks_failed: AtomicU64,
    pub tasks_cancelled: AtomicU64,
    pub steps_started: AtomicU64,
    pub steps_failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrchestratorSnapshot {
    pub tasks_created: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub tasks_cancelled: u64,
    pub steps_started: u64,
    pub steps_failed: u64,
}

impl OrchestratorStats {
    /// Folds one published event into the running counters. Called by
    /// whatever drives the event mesh's subscriber loop; kept separate
    /// from `WorkflowOrchestrator` itself so a caller can track stats for
    /// a subset of tasks without the orchestrator knowing about it.
    pub fn record(&self, kind: &AgentEventKind) {
        match kind {
            AgentEventKind::TaskCreated { .. } => self.tasks_created.fetch_add(1, Ordering::Relaxed),
            AgentEventKind::TaskCompleted { .. } => self.tasks_completed.fetch_add(1, Ordering::Relaxed),
            AgentEventKind::TaskFailed { .. } => self.tasks_failed.fetch_add(1, Ordering::Relaxed),
            AgentEventKind::TaskCancelled => self.tasks_cancelled.fetch_add(1, Ordering::Relaxed),
            AgentEventKind::StepStarted { .. } => self.steps_started.fetch_add(1, Ordering::Relaxed),
            AgentEventKind::StepFailed { .. } => self.steps_failed.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };
    }

    pub fn snapshot(&self) -> OrchestratorSnapshot {
        OrchestratorSnapshot {
            tasks_created: self.tasks_created.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            tasks_cancelled: self.tasks_cancelled.load(Ordering::Relaxed),
            steps_started: self.steps_started.load(Ordering::Relaxed),
            steps_failed: self.steps_failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_increments_the_matching_counter_only() {
        let stats = OrchestratorStats::default();
        stats.record(&AgentEventKind::TaskCreated { workflow: vec!["import".into()], user: "u".into() });
        stats.record(&AgentEventKind::StepStarted { step_index: 0, agent_type: "import".into(), attempt: 1 });
        stats.record(&AgentEventKind::StepStarted { step_index: 0, agent_type: "import".into(), attempt: 2 });

        let snap = stats.snapshot();
        assert_eq!(snap.tasks_created, 1);
        assert_eq!(snap.steps_started, 2);
        assert_eq!(snap.tasks_completed, 0);
    }
}
