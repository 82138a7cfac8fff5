//! Workflow catalog (spec §6.2): declarative task-type -> agent-sequence
//! mapping, read once at startup.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct WorkflowCatalog {
    workflows: HashMap<String, Vec<String>>,
}

impl WorkflowCatalog {
    pub fn new() -> Self {
        Self { workflows: HashMap::new() }
    }

    /// The catalog every deployment of this substrate ships with.
    pub fn default_catalog() -> Self {
        let mut c = Self::new();
        c.register("quick_import", vec!["import"]);
        c.register(
            "full_import",
            vec!["import", "validation", "enrichment", "categorization", "embedding"],
        );
        c.register("revalidate", vec!["validation"]);
        c
    }

    pub fn register(&mut self, task_type: impl Into<String>, agents: Vec<impl Into<String>>) {
        self.workflows.insert(task_type.into(), agents.into_iter().map(Into::into).collect());
    }

    pub fn resolve(&self, task_type: &str) -> Option<&[String]> {
        self.workflows.get(task_type).map(|v| v.as_slice())
    }
}

impl Default for WorkflowCatalog {
    fn default() -> Self {
        Self::default_catalog()
    }
}
