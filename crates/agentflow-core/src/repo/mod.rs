//! Task Store read model (replay).

pub mod types;

pub use types::{InMemoryTaskRepository, StepSlot, StepStatus, TaskInstance, TaskRepository};
