//! minion binary — distributed lookup worker for the hashcrack service.

mod config;
mod health;
mod job_loop;
mod lookup;
mod metrics;
mod queue;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::MinionConfig;
use health::HealthState;
use metrics::MinionMetrics;
use queue::QueueClient;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = MinionConfig::from_env()?;
    info!("Starting minion {}", config.worker_id);

    let pool = Arc::new(
        PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.database_url)
            .await?,
    );
    info!("Connected to database");

    let queue = Arc::new(QueueClient::connect(&config.nats_url).await?);
    info!("Connected to NATS at {}", config.nats_url);

    let minion_metrics = MinionMetrics::new();

    let ready = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let health_state = Arc::new(HealthState {
        metrics: minion_metrics.clone(),
        ready: ready.clone(),
    });

    let metrics_port = config.metrics_port;
    let health_router = health::health_router(health_state);
    tokio::spawn(async move {
        let addr = format!("0.0.0.0:{}", metrics_port);
        info!("Metrics server listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
        axum::serve(listener, health_router).await.unwrap();
    });

    job_loop::spawn_workers(pool, queue, minion_metrics, config.work_concurrency);
    info!(
        "Work loop started ({} concurrent tasks)",
        config.work_concurrency
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}
