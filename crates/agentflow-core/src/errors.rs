//! Orchestrator-level errors, plus the `classify_error` bridge persistence
//! backends use to decide how to log a failed step.

use agentflow_types::ErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum OrchestratorError {
    #[error("task already in a terminal state")]
    TaskTerminal,
    #[error("invalid step index")]
    InvalidStepIndex,
    #[error("unknown workflow type: {0}")]
    UnknownWorkflow(String),
    #[error("task not found")]
    TaskNotFound,
    #[error("step already terminal")]
    StepAlreadyTerminal,
    #[error("concurrent update to task state")]
    ConcurrentUpdate,
    #[error("internal: {0}")]
    Internal(String),
}

/// Coarse classification used by persistence backends when logging a
/// `StepFailed` event -- independent of the fine-grained `ErrorKind` an
/// agent reports, since persistence only needs to decide how to file it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    Validation,
    Runtime,
    Transient,
    Permanent,
}

pub fn classify_error(kind: &ErrorKind) -> ErrorClass {
    match kind {
        ErrorKind::InvalidInput => ErrorClass::Validation,
        ErrorKind::Cancelled => ErrorClass::Runtime,
        ErrorKind::Timeout | ErrorKind::Transient | ErrorKind::Unavailable | ErrorKind::BackpressureExceeded => {
            ErrorClass::Transient
        }
        ErrorKind::Permanent => ErrorClass::Permanent,
        ErrorKind::ConcurrentUpdate => ErrorClass::Runtime,
    }
}
