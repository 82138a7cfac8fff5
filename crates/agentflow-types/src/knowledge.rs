//! Knowledge graph node and edge types (spec §3.6, §3.7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const EMBEDDING_DIMS: usize = 1536;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: Uuid,
    pub fingerprint: String,
    pub category: String,
    pub description: String,
    pub error_patterns: Vec<String>,
    pub context: Value,
    pub severity: ProblemSeverity,
    pub occurrence_count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionAction {
    pub kind: String,
    pub target: String,
    pub parameters: Value,
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub id: Uuid,
    pub description: String,
    pub actions: Vec<SolutionAction>,
    pub prerequisites: Vec<String>,
    pub side_effects: Vec<String>,
    pub attempt_count: u64,
    pub success_count: u64,
    pub avg_resolution_time_ms: f64,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Solution {
    pub fn success_rate(&self) -> f64 {
        if self.attempt_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.attempt_count as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    Error,
    Performance,
    Security,
    Behavioral,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingRule {
    pub field: String,
    pub operator: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: Uuid,
    pub kind: PatternKind,
    pub matching_rules: Vec<MatchingRule>,
    pub actions: Vec<SolutionAction>,
    pub confidence: f64,
    pub occurrences: u64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub id: Uuid,
    pub summary: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub id: Uuid,
    pub name: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relationship {
    Solves,
    Causes,
    Requires,
    SimilarTo,
    EvolvesInto,
    Implements,
    Validates,
    ConflictsWith,
    DependsOn,
    Triggers,
    LeadsTo,
    Mitigates,
    Collaborates,
}

impl Relationship {
    /// Edges in these relationships must never form a cycle.
    pub fn must_be_acyclic(&self) -> bool {
        matches!(self, Relationship::Solves | Relationship::Requires)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEdge {
    pub from: Uuid,
    pub to: Uuid,
    pub relationship: Relationship,
    pub weight: f64,
    pub metadata: Value,
}

impl KnowledgeEdge {
    pub fn new(from: Uuid, to: Uuid, relationship: Relationship, weight: f64) -> Self {
        Self { from, to, relationship, weight, metadata: Value::Null }
    }
}
