//! agentflow-types: wire/domain types shared by every orchestration crate.
//!
//! This crate carries no orchestration logic of its own. It defines the
//! shapes that flow between the task store, the worker pools, the event
//! mesh and the knowledge graph, plus the error-kind taxonomy all of them
//! map their failures onto.

pub mod artifact;
pub mod capability;
pub mod error;
pub mod knowledge;
pub mod message;
pub mod task;

pub use artifact::Artifact;
pub use capability::{AgentStatus, CapabilityCard, PortSchema};
pub use error::{AgentError, ErrorKind};
pub use knowledge::{
    Insight, KnowledgeEdge, MatchingRule, Pattern, PatternKind, Problem, ProblemSeverity,
    Relationship, Solution, SolutionAction, Tool, EMBEDDING_DIMS,
};
pub use message::{Message, MessageKind};
pub use task::{RetryPolicy, Task, TaskStatus};
