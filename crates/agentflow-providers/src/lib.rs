//! agentflow-providers: deterministic reference agents implementing
//! the default catalog's `[import, validation, enrichment,
//! categorization, embedding]` workflow. These are illustrative
//! stand-ins for tests and the CLI demo — concrete HTML parsing, AI
//! providers, and URL fetchers stay out of this core's scope (spec §1).

pub mod categorization;
pub mod embedding;
pub mod enrichment;
pub mod import;
pub mod validation;

pub use categorization::CategorizationAgent;
pub use embedding::EmbeddingAgent;
pub use enrichment::EnrichmentAgent;
pub use import::ImportAgent;
pub use validation::ValidationAgent;
