//! `enrichment`: attaches derived metadata to each validated bookmark.
//! A real enrichment agent would fetch and parse the page; this
//! deterministic stand-in derives metadata purely from the title/url
//! already on hand, matching the no-network contract tests exercise
//! this substrate against.

use agentflow_types::AgentError;
use agentflow_workers::{Agent, AgentOutput, AgentTaskView, CancellationToken};
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct EnrichmentAgent;

#[async_trait]
impl Agent for EnrichmentAgent {
    fn agent_type(&self) -> &str {
        "enrichment"
    }

    async fn execute(&self, view: AgentTaskView, cancel: CancellationToken) -> Result<AgentOutput, AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::cancelled());
        }

        let valid = view
            .context
            .get("validation.valid_bookmarks")
            .and_then(Value::as_array)
            .ok_or_else(|| AgentError::invalid_input("missing required context key 'validation.valid_bookmarks'"))?;

        let enriched: Vec<Value> = valid
            .iter()
            .map(|bookmark| {
                let title = bookmark.get("title").and_then(Value::as_str).unwrap_or_default();
                let mut enriched = bookmark.clone();
                if let Value::Object(map) = &mut enriched {
                    map.insert("word_count".into(), json!(title.split_whitespace().count()));
                    map.insert("slug".into(), json!(slugify(title)));
                }
                enriched
            })
            .collect();

        Ok(AgentOutput {
            type_tag: "enrichment.result".into(),
            data: json!({ "enriched": enriched }),
            progress: vec![("enriched bookmarks".into(), 100)],
        })
    }
}

fn slugify(title: &str) -> String {
    title.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn adds_word_count_and_slug_per_bookmark() {
        let agent = EnrichmentAgent;
        let context = json!({ "validation.valid_bookmarks": [{ "url": "https://a.example", "title": "Rust Lang" }] });
        let view = AgentTaskView { task_id: Uuid::new_v4(), step_index: 2, attempt: 1, context };
        let out = agent.execute(view, CancellationToken::new()).await.unwrap();
        let enriched = &out.data["enriched"][0];
        assert_eq!(enriched["word_count"], json!(2));
        assert_eq!(enriched["slug"], json!("rust-lang"));
    }
}
