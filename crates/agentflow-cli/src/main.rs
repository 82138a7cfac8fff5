//! agentflow-cli: wires the six orchestration components together end
//! to end and runs one `full_import` task to completion against the
//! reference agents in `agentflow-providers`. For more advanced usage
//! (persistence, multiple concurrent tasks), build on top of
//! `agentflow-core`/`agentflow-persistence` directly.

use std::sync::Arc;
use std::time::Duration;

use agentflow_core::{EventMesh, InMemoryEventStore, QueueWatermarks, TaskStore, WorkflowCatalog, WorkflowOrchestrator};
use agentflow_providers::{CategorizationAgent, EmbeddingAgent, EnrichmentAgent, ImportAgent, ValidationAgent};
use agentflow_registry::AgentRegistry;
use agentflow_types::{AgentStatus, CapabilityCard, PortSchema, RetryPolicy};
use agentflow_workers::{Agent, JobResult, PoolManager, WorkerPool};
use serde_json::json;
use tokio::sync::mpsc;

fn card(agent_type: &str, required_input: Option<&str>, concurrency_limit: usize) -> CapabilityCard {
    CapabilityCard {
        agent_type: agent_type.to_string(),
        version: "1.0.0".to_string(),
        description: format!("reference {agent_type} agent"),
        inputs: required_input
            .map(|name| vec![PortSchema { name: name.to_string(), value_type: "array".to_string(), required: true }])
            .unwrap_or_default(),
        output_type_tag: format!("{agent_type}.result"),
        concurrency_limit,
        protocols: vec!["json".to_string()],
        status: AgentStatus::Active,
        default_timeout_ms: 5_000,
    }
}

fn spawn_pool(
    manager: &PoolManager,
    agent: Arc<dyn Agent>,
    concurrency_limit: usize,
    combined_tx: mpsc::UnboundedSender<JobResult>,
) {
    let (pool, mut rx) = WorkerPool::new(agent, concurrency_limit, Duration::from_secs(10), 5, Duration::from_secs(30));
    manager.insert(pool);
    tokio::spawn(async move {
        while let Some(result) = rx.recv().await {
            if combined_tx.send(result).is_err() {
                break;
            }
        }
    });
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    println!("agentflow-cli");
    println!("=============");

    let registry = Arc::new(AgentRegistry::new());
    registry.register(card("import", Some("urls"), 4));
    registry.register(card("validation", Some("import.bookmarks"), 4));
    registry.register(card("enrichment", Some("validation.valid_bookmarks"), 4));
    registry.register(card("categorization", Some("enrichment.enriched"), 4));
    registry.register(card("embedding", Some("categorization.categorized"), 2));

    let manager = Arc::new(PoolManager::new());
    let (combined_tx, mut combined_rx) = mpsc::unbounded_channel::<JobResult>();
    spawn_pool(&manager, Arc::new(ImportAgent), 4, combined_tx.clone());
    spawn_pool(&manager, Arc::new(ValidationAgent), 4, combined_tx.clone());
    spawn_pool(&manager, Arc::new(EnrichmentAgent), 4, combined_tx.clone());
    spawn_pool(&manager, Arc::new(CategorizationAgent), 4, combined_tx.clone());
    spawn_pool(&manager, Arc::new(EmbeddingAgent::default()), 2, combined_tx.clone());
    drop(combined_tx);

    let mesh = Arc::new(EventMesh::new(InMemoryEventStore::new()));
    let store = TaskStore::new();
    let orchestrator = Arc::new(WorkflowOrchestrator::new(mesh.clone(), store, WorkflowCatalog::default_catalog()));

    let mut context = std::collections::BTreeMap::new();
    context.insert(
        "urls".to_string(),
        json!(["https://www.rust-lang.org/learn", "https://docs.rs/tokio", "https://example.com"]),
    );

    let task = orchestrator.submit_task("full_import", "demo-user", context, 10).await.expect("submit task");
    println!("submitted task {} with workflow {:?}", task.id, task.workflow);

    let mut live_events = orchestrator.subscribe(task.id).await;
    tokio::spawn(async move {
        while let Ok(event) = live_events.recv().await {
            if let agentflow_core::AgentEventKind::Progress { agent_type, progress, .. } = &event.kind {
                println!("  [{agent_type}] progress={progress}");
            }
        }
    });

    // Backpressure marks (spec §4.5/§5): queue depth past the high-water
    // mark drains an agent so the registry reflects it, without turning
    // transient backpressure into a hard dispatch failure the way an
    // `InvalidInput` validation error would.
    let watermarks = QueueWatermarks::from_env();
    loop {
        manager.enforce_backpressure(&registry, watermarks);

        let registry = registry.clone();
        let dispatch = orchestrator
            .next_dispatch(task.id, move |agent_type, context_obj| {
                registry
                    .resolve(agent_type)
                    .ok_or_else(|| vec![format!("agent '{agent_type}' is not registered")])
                    .and_then(|card| card.validate_inputs(context_obj))
            })
            .await
            .expect("next dispatch");

        let dispatch = match dispatch {
            Some(d) => d,
            None => break,
        };

        println!("dispatching step {} -> {}", dispatch.step_index, dispatch.agent_type);
        manager.enqueue(dispatch.clone()).await;

        let result = combined_rx.recv().await.expect("worker pool result channel closed unexpectedly");
        match result.outcome {
            Ok(output) => {
                orchestrator
                    .record_step_success(result.task_id, result.step_index, &result.agent_type, &output.type_tag, output.data)
                    .await
                    .expect("record step success");
            }
            Err(error) => {
                let policy = RetryPolicy::default();
                let outcome = orchestrator
                    .record_step_failure(result.task_id, result.step_index, &result.agent_type, result.attempt, error, &policy)
                    .await
                    .expect("record step failure");
                match outcome {
                    agentflow_core::StepOutcome::Retrying { delay_ms } => {
                        // `next_dispatch` re-issues the same (now-failed)
                        // step on the next loop iteration once its cursor
                        // is still unadvanced; honor the computed backoff
                        // before looping back into it.
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                    agentflow_core::StepOutcome::Failed => {
                        println!("task failed permanently");
                        break;
                    }
                }
            }
        }
    }

    let final_task = orchestrator.get_task(task.id).await.expect("task still exists");
    let artifacts = orchestrator.get_artifacts(task.id).await;
    println!("final status: {:?}", final_task.status);
    println!("artifacts produced: {}", artifacts.len());
    for artifact in &artifacts {
        println!("  step {} ({}) artifact_id={}", artifact.step_index, artifact.agent_type, artifact.id);
    }
}
