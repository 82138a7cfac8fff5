use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("node {0} not found")]
    NotFound(Uuid),
    #[error("edge {from} -{relationship:?}-> {to} would close a cycle in an acyclic relationship")]
    CycleDetected { from: Uuid, to: Uuid, relationship: agentflow_types::Relationship },
}
