//! `validation`: rejects malformed/duplicate URLs before any enrichment
//! spends effort on them. Deterministic: the same input bookmark set
//! always produces the same accept/reject split.

use agentflow_types::AgentError;
use agentflow_workers::{Agent, AgentOutput, AgentTaskView, CancellationToken};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;

pub struct ValidationAgent;

#[async_trait]
impl Agent for ValidationAgent {
    fn agent_type(&self) -> &str {
        "validation"
    }

    async fn execute(&self, view: AgentTaskView, cancel: CancellationToken) -> Result<AgentOutput, AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::cancelled());
        }

        let bookmarks = view
            .context
            .get("import.bookmarks")
            .and_then(Value::as_array)
            .ok_or_else(|| AgentError::invalid_input("missing required context key 'import.bookmarks'"))?;

        let mut seen = HashSet::new();
        let mut valid = Vec::new();
        let mut rejected = Vec::new();

        for bookmark in bookmarks {
            let url = bookmark.get("url").and_then(Value::as_str).unwrap_or_default();
            let is_well_formed = url.starts_with("http://") || url.starts_with("https://");
            if !is_well_formed {
                rejected.push(json!({ "url": url, "reason": "not an http(s) url" }));
            } else if !seen.insert(url.to_string()) {
                rejected.push(json!({ "url": url, "reason": "duplicate" }));
            } else {
                valid.push(bookmark.clone());
            }
        }

        Ok(AgentOutput {
            type_tag: "validation.result".into(),
            data: json!({ "valid_bookmarks": valid, "rejected": rejected }),
            progress: vec![("validated bookmarks".into(), 100)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn drops_duplicates_and_malformed_urls() {
        let agent = ValidationAgent;
        let context = json!({
            "import.bookmarks": [
                { "url": "https://a.example", "title": "A" },
                { "url": "https://a.example", "title": "A dup" },
                { "url": "ftp://b.example", "title": "B" },
            ]
        });
        let view = AgentTaskView { task_id: Uuid::new_v4(), step_index: 1, attempt: 1, context };
        let out = agent.execute(view, CancellationToken::new()).await.unwrap();
        assert_eq!(out.data["valid_bookmarks"].as_array().unwrap().len(), 1);
        assert_eq!(out.data["rejected"].as_array().unwrap().len(), 2);
    }
}
