//! Pool-wide circuit breaker (spec §4.5): layered on top of per-task
//! retries, this trips a whole agent pool after a run of consecutive
//! transient/timeout failures and lets it cool down before probing again.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    consecutive_failures: AtomicU32,
    opened_at_millis: AtomicU64,
    epoch: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Closed,
    /// Breaker is open and still cooling down; dispatch must be rejected.
    Open,
    /// Cooldown elapsed; let exactly this one job through as a probe.
    HalfOpen,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self { threshold, cooldown, consecutive_failures: AtomicU32::new(0), opened_at_millis: AtomicU64::new(0), epoch: Instant::now() }
    }

    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    pub fn gate(&self) -> Gate {
        let opened_at = self.opened_at_millis.load(Ordering::SeqCst);
        if opened_at == 0 {
            return Gate::Closed;
        }
        let elapsed = Duration::from_millis(self.now_millis().saturating_sub(opened_at));
        if elapsed >= self.cooldown {
            Gate::HalfOpen
        } else {
            Gate::Open
        }
    }

    pub fn on_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.opened_at_millis.store(0, Ordering::SeqCst);
    }

    pub fn on_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= self.threshold {
            let opened_at = self.opened_at_millis.load(Ordering::SeqCst);
            if opened_at == 0 {
                self.opened_at_millis.store(self.now_millis().max(1), Ordering::SeqCst);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_after_threshold_consecutive_failures() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(60));
        assert_eq!(cb.gate(), Gate::Closed);
        cb.on_failure();
        cb.on_failure();
        assert_eq!(cb.gate(), Gate::Closed);
        cb.on_failure();
        assert_eq!(cb.gate(), Gate::Open);
    }

    #[test]
    fn success_resets_the_breaker() {
        let cb = CircuitBreaker::new(2, Duration::from_secs(60));
        cb.on_failure();
        cb.on_success();
        cb.on_failure();
        assert_eq!(cb.gate(), Gate::Closed);
    }
}
