//! Workflow Orchestrator (C4).

pub mod dispatch;
pub mod orchestrator;

pub use dispatch::{StepDispatch, StepOutcome};
pub use orchestrator::WorkflowOrchestrator;
