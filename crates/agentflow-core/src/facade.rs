//! The public control surface (spec §6.1). An HTTP/SSE layer (out of
//! scope per §1) would sit on top of this trait without the substrate
//! knowing anything about HTTP: `subscribe_task_stream` hands back the
//! same `broadcast::Receiver<AgentEvent>` the event mesh already
//! produces, ready to drive server-sent events.

use std::collections::BTreeMap;

use agentflow_types::{Artifact, Task};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::errors::OrchestratorError;
use crate::event::{AgentEvent, EventStore};
use crate::engine::WorkflowOrchestrator;

#[async_trait]
pub trait OrchestrationFacade {
    async fn submit_task(
        &self,
        task_type: &str,
        user: &str,
        context: BTreeMap<String, Value>,
        priority: i32,
    ) -> Result<Task, OrchestratorError>;

    async fn get_task(&self, id: Uuid) -> Option<Task>;
    async fn list_tasks(&self, user: Option<&str>) -> Vec<Task>;
    async fn subscribe_task_stream(&self, id: Uuid) -> broadcast::Receiver<AgentEvent>;
    async fn get_task_artifacts(&self, id: Uuid) -> Vec<Artifact>;
    async fn cancel_task(&self, id: Uuid) -> Result<(), OrchestratorError>;
}

#[async_trait]
impl<E: EventStore + Send + Sync + 'static> OrchestrationFacade for WorkflowOrchestrator<E> {
    async fn submit_task(
        &self,
        task_type: &str,
        user: &str,
        context: BTreeMap<String, Value>,
        priority: i32,
    ) -> Result<Task, OrchestratorError> {
        WorkflowOrchestrator::submit_task(self, task_type, user, context, priority).await
    }

    async fn get_task(&self, id: Uuid) -> Option<Task> {
        WorkflowOrchestrator::get_task(self, id).await
    }

    async fn list_tasks(&self, user: Option<&str>) -> Vec<Task> {
        WorkflowOrchestrator::list_tasks(self, user).await
    }

    async fn subscribe_task_stream(&self, id: Uuid) -> broadcast::Receiver<AgentEvent> {
        WorkflowOrchestrator::subscribe(self, id).await
    }

    async fn get_task_artifacts(&self, id: Uuid) -> Vec<Artifact> {
        WorkflowOrchestrator::get_artifacts(self, id).await
    }

    async fn cancel_task(&self, id: Uuid) -> Result<(), OrchestratorError> {
        WorkflowOrchestrator::cancel_task(self, id).await
    }
}
