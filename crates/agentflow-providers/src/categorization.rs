//! `categorization`: assigns each bookmark one category from a small,
//! fixed taxonomy by keyword match against its slug. Falls back to
//! "uncategorized" rather than failing, since an unmatched bookmark is
//! not an input error.

use agentflow_types::AgentError;
use agentflow_workers::{Agent, AgentOutput, AgentTaskView, CancellationToken};
use async_trait::async_trait;
use serde_json::{json, Value};

const TAXONOMY: &[(&str, &[&str])] = &[
    ("engineering", &["rust", "code", "dev", "engineering", "api"]),
    ("news", &["news", "times", "post", "daily"]),
    ("reference", &["docs", "wiki", "reference", "manual"]),
];

pub struct CategorizationAgent;

#[async_trait]
impl Agent for CategorizationAgent {
    fn agent_type(&self) -> &str {
        "categorization"
    }

    async fn execute(&self, view: AgentTaskView, cancel: CancellationToken) -> Result<AgentOutput, AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::cancelled());
        }

        let enriched = view
            .context
            .get("enrichment.enriched")
            .and_then(Value::as_array)
            .ok_or_else(|| AgentError::invalid_input("missing required context key 'enrichment.enriched'"))?;

        let categorized: Vec<Value> = enriched
            .iter()
            .map(|bookmark| {
                let slug = bookmark.get("slug").and_then(Value::as_str).unwrap_or_default();
                let category = categorize(slug);
                let mut categorized = bookmark.clone();
                if let Value::Object(map) = &mut categorized {
                    map.insert("category".into(), json!(category));
                }
                categorized
            })
            .collect();

        Ok(AgentOutput {
            type_tag: "categorization.result".into(),
            data: json!({ "categorized": categorized }),
            progress: vec![("categorized bookmarks".into(), 100)],
        })
    }
}

fn categorize(slug: &str) -> &'static str {
    TAXONOMY
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| slug.contains(kw)))
        .map(|(category, _)| *category)
        .unwrap_or("uncategorized")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn matches_known_keyword_and_falls_back_otherwise() {
        let agent = CategorizationAgent;
        let context = json!({
            "enrichment.enriched": [
                { "url": "https://a.example", "title": "Rust Lang", "slug": "rust-lang", "word_count": 2 },
                { "url": "https://b.example", "title": "Random Thing", "slug": "random-thing", "word_count": 2 },
            ]
        });
        let view = AgentTaskView { task_id: Uuid::new_v4(), step_index: 3, attempt: 1, context };
        let out = agent.execute(view, CancellationToken::new()).await.unwrap();
        let categorized = out.data["categorized"].as_array().unwrap();
        assert_eq!(categorized[0]["category"], json!("engineering"));
        assert_eq!(categorized[1]["category"], json!("uncategorized"));
    }
}
