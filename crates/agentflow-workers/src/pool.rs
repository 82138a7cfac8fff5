//! Agent Worker Pool (C5): one pool per registered agent type, bounded
//! to the capability card's concurrency limit via a `tokio::sync::
//! Semaphore`, with FIFO-by-(priority desc, created asc) dispatch, a
//! per-job timeout, and a pool-wide circuit breaker.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use agentflow_core::StepDispatch;
use agentflow_types::{AgentError, ErrorKind};
use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex, Notify, Semaphore};
use uuid::Uuid;

use crate::agent::{Agent, AgentOutput, AgentTaskView};
use crate::cancel::CancellationToken;
use crate::circuit::{CircuitBreaker, Gate};
use crate::stats::WorkerPoolStats;

#[derive(Debug)]
struct PendingJob {
    dispatch: StepDispatch,
    enqueued_at: Instant,
    seq: u64,
}

impl PartialEq for PendingJob {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}
impl Eq for PendingJob {}

impl Ord for PendingJob {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dispatch
            .priority
            .cmp(&other.dispatch.priority)
            .then_with(|| other.enqueued_at.cmp(&self.enqueued_at))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PendingJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
pub struct JobResult {
    pub task_id: Uuid,
    pub step_index: usize,
    pub agent_type: String,
    pub attempt: u32,
    pub outcome: Result<AgentOutput, AgentError>,
}

pub struct WorkerPool {
    pub agent_type: String,
    agent: Arc<dyn Agent>,
    semaphore: Arc<Semaphore>,
    queue: Mutex<BinaryHeap<PendingJob>>,
    notify: Notify,
    cancellations: DashMap<Uuid, CancellationToken>,
    circuit: CircuitBreaker,
    pub stats: WorkerPoolStats,
    default_timeout: Duration,
    seq_counter: AtomicU64,
    results_tx: mpsc::UnboundedSender<JobResult>,
}

impl WorkerPool {
    pub fn new(
        agent: Arc<dyn Agent>,
        concurrency_limit: usize,
        default_timeout: Duration,
        circuit_threshold: u32,
        circuit_cooldown: Duration,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<JobResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pool = Arc::new(Self {
            agent_type: agent.agent_type().to_string(),
            agent,
            semaphore: Arc::new(Semaphore::new(concurrency_limit.max(1))),
            queue: Mutex::new(BinaryHeap::new()),
            notify: Notify::new(),
            cancellations: DashMap::new(),
            circuit: CircuitBreaker::new(circuit_threshold, circuit_cooldown),
            stats: WorkerPoolStats::default(),
            default_timeout,
            seq_counter: AtomicU64::new(0),
            results_tx: tx,
        });
        pool.clone().spawn_dispatch_loop();
        (pool, rx)
    }

    pub async fn enqueue(&self, dispatch: StepDispatch) {
        let seq = self.seq_counter.fetch_add(1, AtomicOrdering::SeqCst);
        self.stats.waiting.fetch_add(1, AtomicOrdering::Relaxed);
        self.queue.lock().await.push(PendingJob { dispatch, enqueued_at: Instant::now(), seq });
        self.notify.notify_one();
    }

    pub fn cancel(&self, task_id: Uuid) {
        if let Some(token) = self.cancellations.get(&task_id) {
            token.cancel();
        }
    }

    fn spawn_dispatch_loop(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                let job = {
                    let mut queue = self.queue.lock().await;
                    match queue.peek() {
                        None => None,
                        Some(_) => {
                            if self.circuit.gate() == Gate::Open {
                                None
                            } else {
                                queue.pop()
                            }
                        }
                    }
                };

                let job = match job {
                    Some(j) => j,
                    None => {
                        if self.circuit.gate() == Gate::Open {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                        } else {
                            self.notify.notified().await;
                        }
                        continue;
                    }
                };

                self.stats.waiting.fetch_sub(1, AtomicOrdering::Relaxed);
                let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => break,
                };
                let pool = Arc::clone(&self);
                tokio::spawn(async move {
                    let _permit = permit;
                    pool.run_job(job.dispatch).await;
                });
            }
        });
    }

    async fn run_job(&self, dispatch: StepDispatch) {
        self.stats.active.fetch_add(1, AtomicOrdering::Relaxed);
        let token = CancellationToken::new();
        self.cancellations.insert(dispatch.task_id, token.clone());

        let view = AgentTaskView {
            task_id: dispatch.task_id,
            step_index: dispatch.step_index,
            attempt: dispatch.attempt,
            context: dispatch.context,
        };

        let agent = Arc::clone(&self.agent);
        let exec_token = token.clone();
        let outcome = tokio::select! {
            result = agent.execute(view, exec_token) => result,
            _ = tokio::time::sleep(self.default_timeout) => Err(AgentError::timeout(format!("agent {} exceeded {:?}", self.agent_type, self.default_timeout))),
        };

        self.cancellations.remove(&dispatch.task_id);
        self.stats.active.fetch_sub(1, AtomicOrdering::Relaxed);

        match &outcome {
            Ok(_) => {
                self.circuit.on_success();
                self.stats.completed.fetch_add(1, AtomicOrdering::Relaxed);
            }
            Err(e) if matches!(e.kind, ErrorKind::Transient | ErrorKind::Timeout) => {
                self.circuit.on_failure();
                self.stats.failed.fetch_add(1, AtomicOrdering::Relaxed);
            }
            Err(_) => {
                self.stats.failed.fetch_add(1, AtomicOrdering::Relaxed);
            }
        }

        let _ = self.results_tx.send(JobResult {
            task_id: dispatch.task_id,
            step_index: dispatch.step_index,
            agent_type: dispatch.agent_type,
            attempt: dispatch.attempt,
            outcome,
        });
    }
}
