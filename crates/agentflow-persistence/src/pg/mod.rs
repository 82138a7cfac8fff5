//! Postgres (Diesel) implementations of the core's storage traits.
//!
//! - `PgEventStore`: append-only `events` table, ordered by `seq`
//!   (BIGSERIAL), no updates or deletes. Inserts the artifact row in the
//!   same transaction as the `StepFinished` event so a crash can never
//!   leave one without the other.
//! - `PgTaskRepository`: delegates replay to `InMemoryTaskRepository`,
//!   so the durable and in-memory backends reconstruct identical
//!   `TaskInstance`s from the same event stream.
//! - Transient errors (serialization conflicts, dropped connections)
//!   get a small retry-with-backoff wrapper; everything else surfaces
//!   immediately.

use agentflow_core::{AgentEvent, AgentEventKind, EventStore, InMemoryTaskRepository, TaskInstance, TaskRepository};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use serde_json::Value;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::{artifacts, events};

pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        self.pool.get().map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = events)]
struct NewEventRow<'a> {
    stream_id: &'a Uuid,
    event_type: &'a str,
    payload: &'a Value,
}

#[derive(Queryable, Debug)]
struct EventRow {
    seq: i64,
    stream_id: Uuid,
    ts: DateTime<Utc>,
    event_type: String,
    payload: Value,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = artifacts)]
struct NewArtifactRow<'a> {
    task_id: &'a Uuid,
    agent_type: &'a str,
    step_index: i32,
    fingerprint: &'a str,
    data: &'a Value,
}

fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict | PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
                || m.contains("could not serialize access due to concurrent update")
                || m.contains("connection closed")
                || m.contains("connection refused")
                || m.contains("timeout")
        }
        _ => false,
    }
}

fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
where
    F: FnMut() -> Result<T, PersistenceError>,
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * (attempts + 1);
                warn!(attempt = attempts + 1, delay_ms, error = %e, "retrying transient persistence error");
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

fn event_type_for(kind: &AgentEventKind) -> &'static str {
    match kind {
        AgentEventKind::TaskCreated { .. } => "task_created",
        AgentEventKind::StepStarted { .. } => "step_started",
        AgentEventKind::StepFinished { .. } => "step_finished",
        AgentEventKind::StepFailed { .. } => "step_failed",
        AgentEventKind::RetryScheduled { .. } => "retry_scheduled",
        AgentEventKind::TaskPaused => "task_paused",
        AgentEventKind::TaskResumed => "task_resumed",
        AgentEventKind::TaskCancelled => "task_cancelled",
        AgentEventKind::TaskCompleted { .. } => "task_completed",
        AgentEventKind::TaskFailed { .. } => "task_failed",
        AgentEventKind::AgentRegistered { .. } => "agent_registered",
        AgentEventKind::AgentStatusChanged { .. } => "agent_status_changed",
        AgentEventKind::QueueBackpressureEngaged { .. } => "queue_backpressure_engaged",
        AgentEventKind::QueueBackpressureCleared { .. } => "queue_backpressure_cleared",
        AgentEventKind::CircuitOpened { .. } => "circuit_opened",
        AgentEventKind::CircuitClosed { .. } => "circuit_closed",
        AgentEventKind::ProblemRecorded { .. } => "problem_recorded",
        AgentEventKind::SolutionOutcomeRecorded { .. } => "solution_outcome_recorded",
        AgentEventKind::PatternEvolved { .. } => "pattern_evolved",
        AgentEventKind::Progress { .. } => "progress",
    }
}

fn deserialize_row(row: EventRow) -> Option<AgentEvent> {
    let kind: AgentEventKind = serde_json::from_value(row.payload).ok()?;
    Some(AgentEvent { seq: row.seq as u64, stream_id: row.stream_id, kind, ts: row.ts, correlation_id: None })
}

/// Durable, append-only event log backed by Postgres.
pub struct PgEventStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgEventStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> EventStore for PgEventStore<P> {
    fn append_kind(&mut self, stream_id: Uuid, kind: AgentEventKind) -> AgentEvent {
        let event_type = event_type_for(&kind);
        let payload = serde_json::to_value(&kind).expect("serialize AgentEventKind");

        let inserted: (i64, DateTime<Utc>) = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run(|tx_conn| {
                    let (seq, ts): (i64, DateTime<Utc>) = diesel::insert_into(events::table)
                        .values(NewEventRow { stream_id: &stream_id, event_type, payload: &payload })
                        .returning((events::seq, events::ts))
                        .get_result(tx_conn)?;

                    if let AgentEventKind::StepFinished { step_index, agent_type, fingerprint, .. } = &kind {
                        let data = Value::Null;
                        let row = NewArtifactRow {
                            task_id: &stream_id,
                            agent_type,
                            step_index: *step_index as i32,
                            fingerprint,
                            data: &data,
                        };
                        diesel::insert_into(artifacts::table)
                            .values(&row)
                            .on_conflict((artifacts::task_id, artifacts::agent_type, artifacts::step_index))
                            .do_nothing()
                            .execute(tx_conn)?;
                    }

                    Ok::<(i64, DateTime<Utc>), diesel::result::Error>((seq, ts))
                })
                .map_err(PersistenceError::from)
        })
        .expect("insert event");

        debug!(stream_id = %stream_id, seq = inserted.0, kind = event_type, "appended event");
        AgentEvent { seq: inserted.0 as u64, stream_id, kind, ts: inserted.1, correlation_id: None }
    }

    fn list(&self, stream_id: Uuid) -> Vec<AgentEvent> {
        let rows: Vec<EventRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            events::table.filter(events::stream_id.eq(stream_id)).order(events::seq.asc()).load(&mut conn).map_err(PersistenceError::from)
        })
        .unwrap_or_else(|e| {
            error!(stream_id = %stream_id, error = %e, "failed to load event stream");
            Vec::new()
        });
        rows.into_iter().filter_map(deserialize_row).collect()
    }
}

/// Delegates replay to the in-memory reducer so the durable and
/// in-process backends reconstruct identical state from one log.
#[derive(Default)]
pub struct PgTaskRepository;

impl PgTaskRepository {
    pub fn new() -> Self {
        Self
    }
}

impl TaskRepository for PgTaskRepository {
    fn load(&self, task_id: Uuid, events: &[AgentEvent], workflow: &[String]) -> TaskInstance {
        InMemoryTaskRepository::new().load(task_id, events, workflow)
    }
}

pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let min = min_size.max(1);
    let max = max_size.max(1).max(min);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .min_idle(Some(min))
        .max_size(max)
        .build(manager)
        .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;

    let mut conn = pool.get().map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
    run_pending_migrations(&mut conn)?;
    Ok(pool)
}

pub fn build_pool_from_env() -> Result<PgPool, PersistenceError> {
    crate::config::init_dotenv();
    let cfg = crate::config::DbConfig::from_env();
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}
