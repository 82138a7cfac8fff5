//! agentflow-core: the neutral event-sourced substrate underlying the
//! orchestration system.
//!
//! - `event`: durable, ordered event log (C1's storage half) plus live
//!   fan-out to subscribers (C1's push half).
//! - `repo`: replay of the event log into task-level state (C2's read
//!   model).
//! - `store`: authoritative task/artifact/message storage (C2's write
//!   side).
//! - `catalog`: the declarative workflow catalog (spec §6.2).
//! - `engine`: the `WorkflowOrchestrator` state machine (C4).
//! - `hashing`: canonical-JSON serialization and BLAKE3 fingerprints,
//!   reused by the knowledge graph for problem fingerprints.
//! - `errors`: orchestrator error type plus the error-class bridge used
//!   by persistence backends.
//! - `facade`: the `OrchestrationFacade` control-plane trait an HTTP/SSE
//!   layer would sit on top of (spec §6.1).
//! - `stats`: plain atomic counters for orchestrator observability.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod errors;
pub mod event;
pub mod facade;
pub mod hashing;
pub mod repo;
pub mod stats;
pub mod store;

pub use catalog::WorkflowCatalog;
pub use config::{QueueWatermarks, RetentionConfig};
pub use engine::{StepDispatch, StepOutcome, WorkflowOrchestrator};
pub use errors::{classify_error, ErrorClass, OrchestratorError};
pub use event::{AgentEvent, AgentEventKind, EventFilter, EventMesh, EventStore, InMemoryEventStore};
pub use facade::OrchestrationFacade;
pub use repo::{InMemoryTaskRepository, StepSlot, StepStatus, TaskInstance, TaskRepository};
pub use stats::{OrchestratorSnapshot, OrchestratorStats};
pub use store::TaskStore;
