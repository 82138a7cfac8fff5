//! agentflow-workers: the Agent Worker Pool (C5).
//!
//! `Agent` is the contract concrete agents implement. `WorkerPool` runs
//! one bounded-concurrency queue per agent type; `PoolManager` keeps one
//! pool per registered agent type and routes dispatches to it.

pub mod agent;
pub mod cancel;
pub mod circuit;
pub mod manager;
pub mod pool;
pub mod stats;

pub use agent::{Agent, AgentOutput, AgentTaskView};
pub use cancel::CancellationToken;
pub use circuit::{CircuitBreaker, Gate};
pub use manager::{schedule_retry, PoolManager};
pub use pool::{JobResult, WorkerPool};
pub use stats::{WorkerPoolSnapshot, WorkerPoolStats};
