//! Work loop — pulls batches from the shared `work` consumer and resolves them.

use anyhow::Result;
use async_nats::jetstream::AckKind;
use futures::StreamExt;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::lookup;
use crate::metrics::MinionMetrics;
use crate::queue::QueueClient;

/// Spawn `concurrency` tasks pulling from the shared `work` consumer.
pub fn spawn_workers(
    pool: Arc<PgPool>,
    queue: Arc<QueueClient>,
    metrics: MinionMetrics,
    concurrency: usize,
) {
    for worker_index in 0..concurrency.max(1) {
        let pool = pool.clone();
        let queue = queue.clone();
        let metrics = metrics.clone();
        tokio::spawn(async move {
            if let Err(e) = run_worker(worker_index, pool, queue, metrics).await {
                error!("Worker task {worker_index} exited: {e}");
            }
        });
    }
}

async fn run_worker(
    worker_index: usize,
    pool: Arc<PgPool>,
    queue: Arc<QueueClient>,
    metrics: MinionMetrics,
) -> Result<()> {
    let consumer = queue.work_consumer().await?;
    let mut messages = consumer.messages().await?;
    info!("Worker task {worker_index} started");

    while let Some(msg) = messages.next().await {
        if let Ok(depth) = queue.work_queue_depth().await {
            metrics.work_queue_depth.set(depth as i64);
        }

        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!("Work consumer error: {e}");
                continue;
            }
        };

        match serde_json::from_slice(&msg.payload) {
            Ok(unit) => {
                metrics.active_batches.inc();
                let outcome = lookup::handle_work_unit(&pool, &queue, unit).await;
                metrics.active_batches.dec();

                match outcome {
                    Ok(()) => {
                        metrics.batches_completed.inc();
                        msg.ack().await.ok();
                    }
                    Err(e) => {
                        warn!("Batch lookup failed, requesting redelivery: {e}");
                        msg.ack_with(AckKind::Nak(None)).await.ok();
                    }
                }
            }
            Err(e) => {
                warn!("Invalid work unit: {e}");
                msg.ack().await.ok();
            }
        }
    }

    Ok(())
}
