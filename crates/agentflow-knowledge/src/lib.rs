//! agentflow-knowledge: the Knowledge Graph (C6), the substrate's
//! learning loop. Problems are deduplicated by fingerprint, Solutions
//! are ranked by similarity/success-rate/recency, and Patterns are
//! synthesized once a Solution proves itself across enough attempts.

pub mod config;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod rules;
pub mod similarity;
pub mod stats;

pub use config::{PatternThresholds, RankingWeights};
pub use embedding::{EmbeddingProvider, HashEmbedder};
pub use error::KnowledgeError;
pub use graph::KnowledgeGraph;
pub use rules::{evaluate_rule, pattern_matches};
pub use similarity::{cosine_similarity, FlatSimilarityIndex, SimilarityIndex};
pub use stats::{KnowledgeGraphSnapshot, KnowledgeGraphStats};
