use std::collections::BTreeMap;
use std::sync::Arc;

use agentflow_core::{EventMesh, InMemoryEventStore, StepOutcome, TaskStore, WorkflowCatalog, WorkflowOrchestrator};
use agentflow_types::{AgentError, ErrorKind, RetryPolicy, TaskStatus};
use serde_json::json;

fn orchestrator() -> WorkflowOrchestrator<InMemoryEventStore> {
    let mesh = Arc::new(EventMesh::new(InMemoryEventStore::new()));
    let store = TaskStore::new();
    WorkflowOrchestrator::new(mesh, store, WorkflowCatalog::default_catalog())
}

fn no_validation(_agent: &str, _ctx: &serde_json::Map<String, serde_json::Value>) -> Result<(), Vec<String>> {
    Ok(())
}

#[tokio::test]
async fn quick_import_runs_single_step_to_completion() {
    let orch = orchestrator();
    let task = orch.submit_task("quick_import", "u1", BTreeMap::new(), 0).await.unwrap();

    let dispatch = orch.next_dispatch(task.id, no_validation).await.unwrap().expect("dispatch");
    assert_eq!(dispatch.agent_type, "import");
    assert_eq!(dispatch.step_index, 0);

    orch.record_step_success(task.id, 0, "import", "bookmark_import_result", json!({"count": 3}))
        .await
        .unwrap();

    let finished = orch.get_task(task.id).await.unwrap();
    assert_eq!(finished.status, TaskStatus::Completed);
    assert_eq!(finished.context.get("import.count"), Some(&json!(3)));

    assert!(orch.next_dispatch(task.id, no_validation).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_artifact_append_is_idempotent() {
    let orch = orchestrator();
    let task = orch.submit_task("quick_import", "u1", BTreeMap::new(), 0).await.unwrap();
    orch.next_dispatch(task.id, no_validation).await.unwrap();

    let a1 = orch.record_step_success(task.id, 0, "import", "x", json!({"v": 1})).await.unwrap();
    let a2 = orch.record_step_success(task.id, 0, "import", "x", json!({"v": 2})).await.unwrap();
    assert_eq!(a1.id, a2.id, "second append for the same (task, agent, step) must return the first artifact");

    let artifacts = orch.get_artifacts(task.id).await;
    assert_eq!(artifacts.len(), 1);
}

#[tokio::test]
async fn retriable_failure_schedules_retry_until_attempts_exhausted() {
    let orch = orchestrator();
    let task = orch.submit_task("revalidate", "u1", BTreeMap::new(), 0).await.unwrap();
    let policy = RetryPolicy { max_attempts: 2, initial_delay_ms: 10, backoff_factor: 2.0, max_delay_ms: 1000 };

    orch.next_dispatch(task.id, no_validation).await.unwrap();
    let outcome = orch
        .record_step_failure(task.id, 0, "validation", 1, AgentError::timeout("slow"), &policy)
        .await
        .unwrap();
    assert!(matches!(outcome, StepOutcome::Retrying { .. }));
    assert_eq!(orch.get_task(task.id).await.unwrap().status, TaskStatus::Running);

    let outcome = orch
        .record_step_failure(task.id, 0, "validation", 2, AgentError::timeout("slow"), &policy)
        .await
        .unwrap();
    assert!(matches!(outcome, StepOutcome::Failed));
    assert_eq!(orch.get_task(task.id).await.unwrap().status, TaskStatus::Failed);
}

#[tokio::test]
async fn permanent_failure_never_retries() {
    let orch = orchestrator();
    let task = orch.submit_task("revalidate", "u1", BTreeMap::new(), 0).await.unwrap();
    orch.next_dispatch(task.id, no_validation).await.unwrap();

    let outcome = orch
        .record_step_failure(task.id, 0, "validation", 1, AgentError::permanent("rejected"), &RetryPolicy::default())
        .await
        .unwrap();
    assert!(matches!(outcome, StepOutcome::Failed));
    assert_eq!(orch.get_task(task.id).await.unwrap().status, TaskStatus::Failed);
}

#[tokio::test]
async fn cancel_prevents_further_dispatch() {
    let orch = orchestrator();
    let task = orch.submit_task("revalidate", "u1", BTreeMap::new(), 0).await.unwrap();
    orch.cancel_task(task.id).await.unwrap();
    assert_eq!(orch.get_task(task.id).await.unwrap().status, TaskStatus::Cancelled);
    assert!(orch.next_dispatch(task.id, no_validation).await.unwrap().is_none());
}

#[tokio::test]
async fn missing_required_input_fails_without_retry() {
    let orch = orchestrator();
    let task = orch.submit_task("revalidate", "u1", BTreeMap::new(), 0).await.unwrap();
    let reject = |_agent: &str, _ctx: &serde_json::Map<String, serde_json::Value>| Err(vec!["file_path".to_string()]);
    let dispatch = orch.next_dispatch(task.id, reject).await.unwrap();
    assert!(dispatch.is_none());
    assert_eq!(orch.get_task(task.id).await.unwrap().status, TaskStatus::Failed);
    let _ = ErrorKind::InvalidInput;
}
