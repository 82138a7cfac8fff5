//! Agent Capability Card (spec §3.4).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    Active,
    Draining,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortSchema {
    pub name: String,
    pub value_type: String,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityCard {
    pub agent_type: String,
    pub version: String,
    pub description: String,
    pub inputs: Vec<PortSchema>,
    pub output_type_tag: String,
    pub concurrency_limit: usize,
    pub protocols: Vec<String>,
    pub status: AgentStatus,
    pub default_timeout_ms: u64,
}

impl CapabilityCard {
    /// Validate that `context` satisfies every required input field.
    pub fn validate_inputs(&self, context: &serde_json::Map<String, Value>) -> Result<(), Vec<String>> {
        let missing: Vec<String> = self
            .inputs
            .iter()
            .filter(|p| p.required)
            .filter(|p| !context.contains_key(&p.name))
            .map(|p| p.name.clone())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}
