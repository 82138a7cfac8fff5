//! Connection configuration loaded from the environment (spec §3.8).
//! Follows the `AGENTFLOW_DATABASE_*` naming convention established for
//! this substrate rather than the bare `DATABASE_URL` some tooling
//! defaults to, so it can coexist with other services' pools.

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let url = env::var("AGENTFLOW_DATABASE_URL").expect("AGENTFLOW_DATABASE_URL not set");
        let min_connections = env::var("AGENTFLOW_DATABASE_MIN_CONNECTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(2);
        let max_connections = env::var("AGENTFLOW_DATABASE_MAX_CONNECTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(16);
        Self { url, min_connections, max_connections }
    }
}

pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
