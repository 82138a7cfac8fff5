//! `embedding`: the pipeline's terminal step. Generates a 1536-dim
//! embedding per categorized bookmark via the same `EmbeddingProvider`
//! contract the knowledge graph uses (spec §9), so similarity search
//! over a user's library and over the learning loop's Problem/Solution
//! nodes share one embedding space.

use std::sync::Arc;

use agentflow_knowledge::{EmbeddingProvider, HashEmbedder};
use agentflow_types::AgentError;
use agentflow_workers::{Agent, AgentOutput, AgentTaskView, CancellationToken};
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct EmbeddingAgent {
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingAgent {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }
}

impl Default for EmbeddingAgent {
    fn default() -> Self {
        Self::new(Arc::new(HashEmbedder))
    }
}

#[async_trait]
impl Agent for EmbeddingAgent {
    fn agent_type(&self) -> &str {
        "embedding"
    }

    async fn execute(&self, view: AgentTaskView, cancel: CancellationToken) -> Result<AgentOutput, AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::cancelled());
        }

        let categorized = view
            .context
            .get("categorization.categorized")
            .and_then(Value::as_array)
            .ok_or_else(|| AgentError::invalid_input("missing required context key 'categorization.categorized'"))?;

        let embedded: Vec<Value> = categorized
            .iter()
            .map(|bookmark| {
                let title = bookmark.get("title").and_then(Value::as_str).unwrap_or_default();
                let embedding = self.provider.embed(title);
                let mut embedded = bookmark.clone();
                if let Value::Object(map) = &mut embedded {
                    map.insert("embedding_dims".into(), json!(embedding.len()));
                    map.insert("embedding".into(), json!(embedding));
                }
                embedded
            })
            .collect();

        Ok(AgentOutput {
            type_tag: "embedding.result".into(),
            data: json!({ "embedded": embedded }),
            progress: vec![("embedded bookmarks".into(), 100)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_types::EMBEDDING_DIMS;
    use uuid::Uuid;

    #[tokio::test]
    async fn produces_a_contract_sized_embedding_per_bookmark() {
        let agent = EmbeddingAgent::default();
        let context = json!({ "categorization.categorized": [{ "url": "https://a.example", "title": "Rust Lang", "category": "engineering" }] });
        let view = AgentTaskView { task_id: Uuid::new_v4(), step_index: 4, attempt: 1, context };
        let out = agent.execute(view, CancellationToken::new()).await.unwrap();
        let embedded = &out.data["embedded"][0];
        assert_eq!(embedded["embedding_dims"], json!(EMBEDDING_DIMS));
        assert_eq!(embedded["embedding"].as_array().unwrap().len(), EMBEDDING_DIMS);
    }
}
