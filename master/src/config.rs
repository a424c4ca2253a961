//! Coordinator configuration from environment variables.

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct MasterConfig {
    pub database_url: String,
    pub nats_url: String,
    pub http_addr: String,
    /// `B` — the configured partition size for work units.
    pub partition_size: i64,
    /// Number of parallel consumer tasks draining the `results` queue.
    pub results_concurrency: usize,
}

impl MasterConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL required")?,
            nats_url: std::env::var("NATS_URL").context("NATS_URL required")?,
            http_addr: std::env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            partition_size: std::env::var("PARTITION_SIZE")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .context("Invalid PARTITION_SIZE")?,
            results_concurrency: std::env::var("RESULTS_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("Invalid RESULTS_CONCURRENCY")?,
        })
    }
}
