//! `import`: the workflow's source step (spec §6.2). No external IO —
//! reads the URL list the task was submitted with and turns it into a
//! deterministic bookmark list. A real importer (browser-export parser,
//! crawler) is a collaborator outside this core's scope (spec §1).

use agentflow_types::AgentError;
use agentflow_workers::{Agent, AgentOutput, AgentTaskView, CancellationToken};
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct ImportAgent;

#[async_trait]
impl Agent for ImportAgent {
    fn agent_type(&self) -> &str {
        "import"
    }

    async fn execute(&self, view: AgentTaskView, cancel: CancellationToken) -> Result<AgentOutput, AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::cancelled());
        }

        let urls = view
            .context
            .get("urls")
            .and_then(Value::as_array)
            .ok_or_else(|| AgentError::invalid_input("missing required context key 'urls'"))?;

        let bookmarks: Vec<Value> = urls
            .iter()
            .filter_map(Value::as_str)
            .map(|url| {
                let title = derive_title(url);
                json!({ "url": url, "title": title })
            })
            .collect();

        if bookmarks.is_empty() {
            return Err(AgentError::invalid_input("'urls' contained no valid string entries"));
        }

        Ok(AgentOutput {
            type_tag: "import.bookmarks".into(),
            data: json!({ "bookmarks": bookmarks }),
            progress: vec![("imported bookmarks".into(), 100)],
        })
    }
}

/// Deterministic stand-in for fetching a page title: the host with any
/// leading `www.` stripped, title-cased on `.`/`-` boundaries.
fn derive_title(url: &str) -> String {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    let host = without_scheme.split('/').next().unwrap_or(without_scheme);
    let host = host.strip_prefix("www.").unwrap_or(host);
    host.split(['.', '-'])
        .filter(|s| !s.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn imports_each_url_as_a_bookmark_with_a_derived_title() {
        let agent = ImportAgent;
        let view = AgentTaskView {
            task_id: Uuid::new_v4(),
            step_index: 0,
            attempt: 1,
            context: json!({ "urls": ["https://www.rust-lang.org/learn", "https://example.com"] }),
        };
        let out = agent.execute(view, CancellationToken::new()).await.unwrap();
        let bookmarks = out.data["bookmarks"].as_array().unwrap();
        assert_eq!(bookmarks.len(), 2);
        assert_eq!(bookmarks[0]["title"], json!("Rust Lang"));
    }

    #[tokio::test]
    async fn missing_urls_key_is_rejected_as_invalid_input() {
        let agent = ImportAgent;
        let view = AgentTaskView { task_id: Uuid::new_v4(), step_index: 0, attempt: 1, context: json!({}) };
        let err = agent.execute(view, CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind, agentflow_types::ErrorKind::InvalidInput);
    }
}
