//! NATS JetStream client — publishes work units, exposes a shared pull
//! consumer for result envelopes.

use anyhow::Result;
use async_nats::jetstream::{self, consumer::PullConsumer, stream::Stream as JsStream};
use hashcrack_core::WorkUnit;

pub const WORK_STREAM: &str = "HASHCRACK_WORK";
pub const WORK_SUBJECT: &str = "hashcrack.work";
pub const RESULTS_STREAM: &str = "HASHCRACK_RESULTS";
pub const RESULTS_SUBJECT: &str = "hashcrack.results";
pub const RESULTS_CONSUMER: &str = "hashcrack-master-results";

/// Coordinator-side broker handle: publishes to `work`, pulls from `results`.
pub struct Broker {
    jetstream: jetstream::Context,
    results_stream: JsStream,
}

impl Broker {
    pub async fn connect(nats_url: &str) -> Result<Self> {
        let client = async_nats::connect(nats_url).await?;
        let jetstream = jetstream::new(client);

        jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: WORK_STREAM.to_string(),
                subjects: vec![WORK_SUBJECT.to_string()],
                retention: jetstream::stream::RetentionPolicy::WorkQueue,
                ..Default::default()
            })
            .await?;

        let results_stream = jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: RESULTS_STREAM.to_string(),
                subjects: vec![RESULTS_SUBJECT.to_string()],
                retention: jetstream::stream::RetentionPolicy::WorkQueue,
                ..Default::default()
            })
            .await?;

        Ok(Self {
            jetstream,
            results_stream,
        })
    }

    /// Publish one work unit. Publishing order across units is not
    /// observable to consumers.
    pub async fn publish_work(&self, unit: &WorkUnit) -> Result<()> {
        let payload = serde_json::to_vec(unit)?;
        self.jetstream
            .publish(WORK_SUBJECT, payload.into())
            .await?
            .await?;
        Ok(())
    }

    /// A durable pull consumer shared across all of this coordinator's
    /// result-aggregation tasks — each message is delivered to exactly one
    /// puller at a time.
    pub async fn results_consumer(&self) -> Result<PullConsumer> {
        let consumer = self
            .results_stream
            .get_or_create_consumer(
                RESULTS_CONSUMER,
                jetstream::consumer::pull::Config {
                    durable_name: Some(RESULTS_CONSUMER.to_string()),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await?;
        Ok(consumer)
    }
}
