//! Agent Registry (C3): the capability-card catalog, lifecycle tracking,
//! and discovery.
//!
//! Registration is serialized through a `DashMap`'s entry API -- the same
//! pattern this workspace's core uses for its concurrent maps -- so
//! concurrent `register` calls for the same agent type converge to one
//! entry (spec P4) without an explicit lock.

use std::time::Duration;

use agentflow_types::{AgentStatus, CapabilityCard};
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone)]
pub struct HealthRecord {
    pub healthy: bool,
    pub last_check: DateTime<Utc>,
    pub detail: String,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryFilter {
    pub status: Option<AgentStatus>,
    pub protocol: Option<String>,
}

pub struct AgentRegistry {
    cards: DashMap<String, CapabilityCard>,
    health: DashMap<String, HealthRecord>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self { cards: DashMap::new(), health: DashMap::new() }
    }

    /// Idempotent: registering the same `agent_type` again is a no-op if
    /// the card is unchanged, and otherwise replaces it in place (a
    /// version bump). Either way there is exactly one entry afterwards.
    pub fn register(&self, card: CapabilityCard) {
        let agent_type = card.agent_type.clone();
        self.cards.insert(agent_type.clone(), card);
        self.health.entry(agent_type).or_insert(HealthRecord {
            healthy: true,
            last_check: Utc::now(),
            detail: "registered".to_string(),
        });
    }

    pub fn resolve(&self, agent_type: &str) -> Option<CapabilityCard> {
        self.cards.get(agent_type).map(|c| c.clone())
    }

    pub fn set_status(&self, agent_type: &str, status: AgentStatus) -> bool {
        if let Some(mut card) = self.cards.get_mut(agent_type) {
            card.status = status;
            true
        } else {
            false
        }
    }

    pub fn discover(&self, filter: &DiscoveryFilter) -> Vec<CapabilityCard> {
        self.cards
            .iter()
            .map(|e| e.value().clone())
            .filter(|c| filter.status.map(|s| s == c.status).unwrap_or(true))
            .filter(|c| filter.protocol.as_ref().map(|p| c.protocols.contains(p)).unwrap_or(true))
            .collect()
    }

    pub fn record_health(&self, agent_type: &str, healthy: bool, detail: impl Into<String>) {
        self.health.insert(agent_type.to_string(), HealthRecord { healthy, last_check: Utc::now(), detail: detail.into() });
    }

    pub fn health_check(&self) -> Vec<(String, HealthRecord)> {
        self.health.iter().map(|e| (e.key().clone(), e.value().clone())).collect()
    }

    /// Health records older than `max_age` are considered stale and
    /// reported as unhealthy by the aggregate, without mutating storage.
    pub fn stale_agents(&self, max_age: Duration) -> Vec<String> {
        let now = Utc::now();
        self.health
            .iter()
            .filter(|e| {
                now.signed_duration_since(e.value().last_check)
                    .to_std()
                    .map(|age| age > max_age)
                    .unwrap_or(false)
            })
            .map(|e| e.key().clone())
            .collect()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_types::PortSchema;

    fn card(agent_type: &str) -> CapabilityCard {
        CapabilityCard {
            agent_type: agent_type.to_string(),
            version: "1.0".to_string(),
            description: "test agent".to_string(),
            inputs: vec![PortSchema { name: "x".into(), value_type: "string".into(), required: true }],
            output_type_tag: "result".to_string(),
            concurrency_limit: 4,
            protocols: vec!["json".to_string()],
            status: AgentStatus::Active,
            default_timeout_ms: 5_000,
        }
    }

    #[test]
    fn duplicate_registration_converges_to_one_entry() {
        let registry = AgentRegistry::new();
        registry.register(card("import"));
        registry.register(card("import"));
        registry.register(card("import"));
        assert_eq!(registry.discover(&DiscoveryFilter::default()).len(), 1);
    }

    #[test]
    fn discover_filters_by_status() {
        let registry = AgentRegistry::new();
        registry.register(card("import"));
        registry.register(card("enrichment"));
        registry.set_status("enrichment", AgentStatus::Draining);

        let active = registry.discover(&DiscoveryFilter { status: Some(AgentStatus::Active), protocol: None });
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].agent_type, "import");
    }

    #[test]
    fn resolve_unknown_agent_is_none() {
        let registry = AgentRegistry::new();
        assert!(registry.resolve("ghost").is_none());
    }
}
