//! Error taxonomy (spec §7).
//!
//! `ErrorKind` is the classification the orchestrator and worker pool act
//! on (retry vs. fail). `AgentError` is the concrete error type agents and
//! the core return; it always carries one `ErrorKind`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    Cancelled,
    Timeout,
    Transient,
    Permanent,
    ConcurrentUpdate,
    Unavailable,
    BackpressureExceeded,
}

impl ErrorKind {
    /// Whether a step failing with this kind should be retried by the
    /// worker pool, subject to the step's `RetryPolicy`.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Timeout | ErrorKind::Transient)
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind:?}: {detail}")]
pub struct AgentError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl AgentError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self { kind, detail: detail.into() }
    }

    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, detail)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "cancelled")
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, detail)
    }

    pub fn transient(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, detail)
    }

    pub fn permanent(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Permanent, detail)
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, detail)
    }
}
