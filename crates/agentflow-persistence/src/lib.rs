//! agentflow-persistence: Postgres-backed implementations of the
//! core's `EventStore` and `TaskRepository`, plus connection pooling,
//! migrations, and the persistence error taxonomy.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_pool, build_pool_from_env, ConnectionProvider, PgEventStore, PgPool, PgTaskRepository, PoolProvider};
