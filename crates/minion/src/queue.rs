//! NATS JetStream queue client: pulls `work`, publishes `results`.

use anyhow::Result;
use async_nats::jetstream::{self, consumer::PullConsumer, stream::Stream as JsStream};
use hashcrack_core::ResultEnvelope;

pub const WORK_STREAM: &str = "HASHCRACK_WORK";
pub const WORK_SUBJECT: &str = "hashcrack.work";
pub const WORK_CONSUMER: &str = "hashcrack-minions";
pub const RESULTS_STREAM: &str = "HASHCRACK_RESULTS";
pub const RESULTS_SUBJECT: &str = "hashcrack.results";

/// Minion-side broker handle: pulls from `work`, publishes to `results`.
pub struct QueueClient {
    jetstream: jetstream::Context,
    work_stream: tokio::sync::Mutex<JsStream>,
}

impl QueueClient {
    /// Connect to NATS and ensure both streams exist.
    pub async fn connect(nats_url: &str) -> Result<Self> {
        let client = async_nats::connect(nats_url).await?;
        let jetstream = jetstream::new(client);

        let work_stream = jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: WORK_STREAM.to_string(),
                subjects: vec![WORK_SUBJECT.to_string()],
                retention: jetstream::stream::RetentionPolicy::WorkQueue,
                ..Default::default()
            })
            .await?;

        jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: RESULTS_STREAM.to_string(),
                subjects: vec![RESULTS_SUBJECT.to_string()],
                retention: jetstream::stream::RetentionPolicy::WorkQueue,
                ..Default::default()
            })
            .await?;

        Ok(Self {
            jetstream,
            work_stream: tokio::sync::Mutex::new(work_stream),
        })
    }

    /// A durable pull consumer shared across all minions — each work unit
    /// is delivered to exactly one puller at a time.
    pub async fn work_consumer(&self) -> Result<PullConsumer> {
        let stream = self.work_stream.lock().await;
        let consumer = stream
            .get_or_create_consumer(
                WORK_CONSUMER,
                jetstream::consumer::pull::Config {
                    durable_name: Some(WORK_CONSUMER.to_string()),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await?;
        Ok(consumer)
    }

    /// Current pending message count on the `work` stream.
    pub async fn work_queue_depth(&self) -> Result<u64> {
        let mut stream = self.work_stream.lock().await;
        let info = stream.info().await?;
        Ok(info.state.messages)
    }

    pub async fn publish_result(&self, envelope: &ResultEnvelope) -> Result<()> {
        let payload = serde_json::to_vec(envelope)?;
        self.jetstream
            .publish(RESULTS_SUBJECT, payload.into())
            .await?
            .await?;
        Ok(())
    }
}
