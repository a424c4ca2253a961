//! Result aggregation — consumes `results`, advances job state, fans out
//! `progress`/`completed` events.

use std::sync::Arc;

use async_nats::jetstream::AckKind;
use futures::StreamExt;
use sqlx::PgPool;
use tracing::{error, info, warn};

use hashcrack_core::{JobStatus, ResultEnvelope};

use crate::broker::Broker;
use crate::db::{self, AggregateOutcome};
use crate::events::{EventBus, EventType};

/// Spawn `concurrency` tasks pulling from the shared `results` consumer.
/// Each task processes one envelope fully before pulling the next; the
/// broker load-balances across them, so envelopes for the same job can
/// land on different tasks — the row lock in `apply_result_envelope` is
/// what keeps that safe.
pub fn spawn_aggregators(
    broker: Arc<Broker>,
    pool: Arc<PgPool>,
    events: Arc<EventBus>,
    concurrency: usize,
) {
    for worker_index in 0..concurrency.max(1) {
        let broker = broker.clone();
        let pool = pool.clone();
        let events = events.clone();
        tokio::spawn(async move {
            if let Err(e) = run_aggregator(worker_index, broker, pool, events).await {
                error!("Aggregator task {worker_index} exited: {e}");
            }
        });
    }
}

async fn run_aggregator(
    worker_index: usize,
    broker: Arc<Broker>,
    pool: Arc<PgPool>,
    events: Arc<EventBus>,
) -> anyhow::Result<()> {
    let consumer = broker.results_consumer().await?;
    let mut messages = consumer.messages().await?;
    info!("Aggregator task {worker_index} started");

    while let Some(msg) = messages.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!("Results consumer error: {e}");
                continue;
            }
        };

        match serde_json::from_slice::<ResultEnvelope>(&msg.payload) {
            Ok(envelope) => {
                // A transient storage error during aggregation is nak'd so
                // the broker redelivers; the processed-batches ledger
                // makes that redelivery safe.
                match handle_envelope(&pool, &events, envelope).await {
                    Ok(()) => {
                        msg.ack().await.ok();
                    }
                    Err(e) => {
                        warn!("Aggregation failed, requesting redelivery: {e}");
                        msg.ack_with(AckKind::Nak(None)).await.ok();
                    }
                }
            }
            Err(e) => {
                warn!("Invalid result envelope: {e}");
                msg.ack().await.ok();
            }
        }
    }

    Ok(())
}

async fn handle_envelope(
    pool: &PgPool,
    events: &EventBus,
    envelope: ResultEnvelope,
) -> anyhow::Result<()> {
    let ResultEnvelope::Batch {
        job_id,
        batch_index,
        hits,
    } = envelope;

    let outcome = db::apply_result_envelope(pool, job_id, batch_index, hits.len() as i64).await?;

    match outcome {
        AggregateOutcome::Applied(job) => {
            events.publish(
                job_id,
                EventType::Progress,
                serde_json::json!({
                    "batchesCompleted": job.batches_completed,
                    "batchesExpected": job.batches_expected,
                    "foundCount": job.found_count,
                }),
            );

            if job.status == JobStatus::Completed {
                events.publish(
                    job_id,
                    EventType::Completed,
                    serde_json::json!({ "jobId": job_id }),
                );
                events.complete(job_id);
            }
        }
        AggregateOutcome::AlreadyProcessed => {
            // Broker replay of a batch we've already counted — no-op.
        }
        AggregateOutcome::JobNotFound => {
            // A late result for a garbage-collected or foreign job.
            // Silently dropped.
        }
    }

    Ok(())
}
