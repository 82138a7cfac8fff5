//! Plain counters for pool observability (spec §6.5) -- no metrics-crate
//! dependency, since that transport is out of this substrate's scope.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct WorkerPoolStats {
    pub waiting: AtomicU64,
    pub active: AtomicU64,
    pub delayed: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPoolSnapshot {
    pub waiting: u64,
    pub active: u64,
    pub delayed: u64,
    pub completed: u64,
    pub failed: u64,
}

impl WorkerPoolStats {
    pub fn snapshot(&self) -> WorkerPoolSnapshot {
        WorkerPoolSnapshot {
            waiting: self.waiting.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
            delayed: self.delayed.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
