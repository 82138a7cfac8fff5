//! Process-wide configuration (spec §3.8): loaded once at startup from
//! the environment (mirroring `chem-persistence::config::DbConfig`'s
//! `dotenvy` + `once_cell::sync::Lazy` idiom) and immutable thereafter --
//! no component re-reads the environment after boot.

use std::time::Duration;

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Archival/grace windows for the event mesh and task store (§9 open
/// questions, resolved here).
#[derive(Debug, Clone, Copy)]
pub struct RetentionConfig {
    pub event_retention: Duration,
    pub message_grace: Duration,
}

impl RetentionConfig {
    pub fn from_env() -> Self {
        Self {
            event_retention: Duration::from_secs(env_u64("AGENTFLOW_EVENT_RETENTION_SECS", 7 * 24 * 3600)),
            message_grace: Duration::from_secs(env_u64("AGENTFLOW_MESSAGE_GRACE_SECS", 3600)),
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Per-agent pool backpressure marks (spec §4.5/§5): when a pool's
/// `waiting` count exceeds `high_water`, the orchestrator marks that
/// agent `draining`; it is restored to `active` once `waiting` drops
/// below `low_water`.
#[derive(Debug, Clone, Copy)]
pub struct QueueWatermarks {
    pub high_water: u64,
    pub low_water: u64,
}

impl QueueWatermarks {
    pub fn from_env() -> Self {
        Self { high_water: env_u64("AGENTFLOW_QUEUE_HIGH_WATER", 100), low_water: env_u64("AGENTFLOW_QUEUE_LOW_WATER", 25) }
    }
}

impl Default for QueueWatermarks {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let watermarks = QueueWatermarks { high_water: 100, low_water: 25 };
        assert!(watermarks.high_water > watermarks.low_water);
    }
}
