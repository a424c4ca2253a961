//! Upload ingestion and partitioning.

use hashcrack_core::{fingerprint, partition, CoreError, Job, WorkUnit};
use tracing::warn;
use uuid::Uuid;

use crate::broker::Broker;
use crate::db;
use crate::events::{EventBus, EventType};

/// Result of ingesting one upload: the created job plus how many non-blank
/// input lines were rejected.
pub struct IngestOutcome {
    pub job: Job,
    pub dropped_lines: u64,
}

/// Run the full ingestion algorithm: parse, persist Job+Targets in one
/// transaction, publish all work units, then emit `job_created`.
///
/// Publishing happens outside the persistence transaction — at
/// least-once semantics mean a crash between commit and full publish can
/// strand a job partially dispatched; no automatic compensation is
/// performed.
pub async fn ingest_upload(
    pool: &sqlx::PgPool,
    broker: &Broker,
    events: &EventBus,
    partition_size: i64,
    body: &str,
) -> Result<IngestOutcome, CoreError> {
    let job_id = Uuid::new_v4();
    let parsed = fingerprint::parse_lines(body);
    let batches_expected = Job::batches_expected_for(parsed.fingerprints.len() as i64, partition_size);

    let job = db::create_job(pool, job_id, &parsed.fingerprints, batches_expected).await?;

    let batches = partition::partition(&parsed.fingerprints, partition_size as usize);
    for (batch_index, fingerprints) in batches {
        let unit = WorkUnit::Batch {
            job_id,
            batch_index,
            fingerprints,
        };
        if let Err(e) = broker.publish_work(&unit).await {
            // The job row is already committed; a publish failure here
            // strands that batch permanently. There is no automatic
            // compensation — the job simply never reaches 100%.
            warn!("Failed to publish work unit {batch_index} for job {job_id}: {e}");
        }
    }

    events.publish(
        job_id,
        EventType::JobCreated,
        serde_json::to_value(&job).unwrap_or_default(),
    );

    if job.status == hashcrack_core::JobStatus::Completed {
        events.publish(
            job_id,
            EventType::Completed,
            serde_json::json!({ "jobId": job_id }),
        );
        events.complete(job_id);
    }

    Ok(IngestOutcome {
        job,
        dropped_lines: parsed.dropped_lines,
    })
}

#[cfg(test)]
mod tests {
    use hashcrack_core::fingerprint::parse_lines;
    use hashcrack_core::Job;

    #[test]
    fn empty_upload_has_zero_batches_expected() {
        let parsed = parse_lines("\n\nshort\n");
        let batches = Job::batches_expected_for(parsed.fingerprints.len() as i64, 1000);
        assert_eq!(parsed.fingerprints.len(), 0);
        assert_eq!(batches, 0);
        assert_eq!(parsed.dropped_lines, 1);
    }
}
