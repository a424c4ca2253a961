//! Minion configuration from environment variables.

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct MinionConfig {
    pub worker_id: String,
    pub nats_url: String,
    pub database_url: String,
    pub metrics_port: u16,
    /// Number of concurrent tasks pulling from the shared `work` consumer.
    pub work_concurrency: usize,
}

impl MinionConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            worker_id: std::env::var("WORKER_ID")
                .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string()),
            nats_url: std::env::var("NATS_URL").context("NATS_URL required")?,
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL required")?,
            metrics_port: std::env::var("METRICS_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()
                .context("Invalid METRICS_PORT")?,
            work_concurrency: std::env::var("WORK_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("Invalid WORK_CONCURRENCY")?,
        })
    }
}
