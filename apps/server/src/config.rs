//! Environment-based server configuration.

use anyhow::Context;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file.
    pub db_path: String,
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Bearer credential that resolves to the administrator identity.
    pub admin_token: String,
    /// Server-configured board credential, used when a job or request does
    /// not carry its own.
    pub miro_access_token: Option<String>,
    /// Whether the background drain scheduler runs.
    pub scheduler_enabled: bool,
    /// Seconds between scheduler ticks.
    pub scheduler_interval_secs: u64,
    /// Jobs processed per worker invocation.
    pub worker_max_jobs: usize,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let admin_token = env_opt("ATELIER_ADMIN_TOKEN")
            .context("ATELIER_ADMIN_TOKEN must be set (administrator bearer credential)")?;

        Ok(Self {
            db_path: env_opt("ATELIER_DB_PATH").unwrap_or_else(|| "data/atelier.db".to_string()),
            bind_addr: env_opt("ATELIER_BIND").unwrap_or_else(|| "127.0.0.1:8787".to_string()),
            admin_token,
            miro_access_token: env_opt("MIRO_ACCESS_TOKEN"),
            scheduler_enabled: env_opt("ATELIER_SCHEDULER")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            scheduler_interval_secs: env_opt("ATELIER_SYNC_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            worker_max_jobs: env_opt("ATELIER_WORKER_MAX_JOBS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        })
    }
}
