//! Postgres persistence for jobs, targets, results and the processed-batch
//! ledger. Schema lives in `schema.sql` at the workspace root — this module
//! assumes the tables already exist (schema administration is out of scope).

use hashcrack_core::{CoreError, Job, JobStatus, TargetWithResult};
use sqlx::PgPool;
use uuid::Uuid;

/// Outcome of aggregating one result envelope.
pub enum AggregateOutcome {
    /// The envelope was new; this is the job's state after applying it.
    Applied(Job),
    /// The `(job_id, batch_index)` pair was already recorded — a broker
    /// replay. No counters moved.
    AlreadyProcessed,
    /// No job exists for this `job_id` — a late or foreign envelope.
    JobNotFound,
}

/// Persist the Job row and its Target rows in one transaction. If
/// `batches_expected` is zero the job is completed immediately: there is
/// no work to dispatch and no envelope will ever arrive to complete it
/// later.
pub async fn create_job(
    pool: &PgPool,
    job_id: Uuid,
    fingerprints: &[String],
    batches_expected: i32,
) -> Result<Job, CoreError> {
    let mut tx = pool.begin().await?;

    let status = if batches_expected == 0 {
        JobStatus::Completed
    } else {
        JobStatus::Running
    };

    let job: Job = sqlx::query_as(
        "INSERT INTO jobs (job_id, status, total_hashes, batches_expected, batches_completed, found_count)
         VALUES ($1, $2, $3, $4, 0, 0)
         RETURNING job_id, created_at, status, total_hashes, batches_expected, batches_completed, found_count",
    )
    .bind(job_id)
    .bind(status)
    .bind(fingerprints.len() as i64)
    .bind(batches_expected)
    .fetch_one(&mut *tx)
    .await?;

    if !fingerprints.is_empty() {
        // One bulk insert; duplicates within the input collapse to a
        // single Target row via the primary key.
        let job_ids = vec![job_id; fingerprints.len()];
        sqlx::query(
            "INSERT INTO targets (job_id, hash_hex)
             SELECT * FROM UNNEST($1::uuid[], $2::text[])
             ON CONFLICT (job_id, hash_hex) DO NOTHING",
        )
        .bind(&job_ids)
        .bind(fingerprints)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(job)
}

/// Load a job by id, or `None` if it doesn't exist.
pub async fn get_job(pool: &PgPool, job_id: Uuid) -> Result<Option<Job>, CoreError> {
    let job = sqlx::query_as(
        "SELECT job_id, created_at, status, total_hashes, batches_expected, batches_completed, found_count
         FROM jobs WHERE job_id = $1",
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;
    Ok(job)
}

/// All completed jobs, most recently created first.
pub async fn list_completed_jobs(pool: &PgPool) -> Result<Vec<Job>, CoreError> {
    let jobs = sqlx::query_as(
        "SELECT job_id, created_at, status, total_hashes, batches_expected, batches_completed, found_count
         FROM jobs WHERE status = $1 ORDER BY created_at DESC",
    )
    .bind(JobStatus::Completed)
    .fetch_all(pool)
    .await?;
    Ok(jobs)
}

/// Apply one result envelope to job state. Dedupes on `(job_id,
/// batch_index)` via the `processed_batches` table so a redelivered
/// envelope is a no-op rather than a double count. The whole thing runs
/// under one row-locked transaction so concurrent aggregator tasks
/// serialize per job.
pub async fn apply_result_envelope(
    pool: &PgPool,
    job_id: Uuid,
    batch_index: i32,
    hits_len: i64,
) -> Result<AggregateOutcome, CoreError> {
    let mut tx = pool.begin().await?;

    let job: Option<Job> = sqlx::query_as(
        "SELECT job_id, created_at, status, total_hashes, batches_expected, batches_completed, found_count
         FROM jobs WHERE job_id = $1 FOR UPDATE",
    )
    .bind(job_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(job) = job else {
        tx.rollback().await?;
        return Ok(AggregateOutcome::JobNotFound);
    };

    let inserted = sqlx::query(
        "INSERT INTO processed_batches (job_id, batch_index) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(job_id)
    .bind(batch_index)
    .execute(&mut *tx)
    .await?;

    if inserted.rows_affected() == 0 {
        // Already observed this batch — a broker replay. No-op.
        tx.rollback().await?;
        return Ok(AggregateOutcome::AlreadyProcessed);
    }

    let new_completed = job.batches_completed + 1;
    let new_found = job.found_count + hits_len;
    let new_status = if new_completed >= job.batches_expected {
        JobStatus::Completed
    } else {
        JobStatus::Running
    };

    let updated: Job = sqlx::query_as(
        "UPDATE jobs SET batches_completed = $2, found_count = $3, status = $4
         WHERE job_id = $1
         RETURNING job_id, created_at, status, total_hashes, batches_expected, batches_completed, found_count",
    )
    .bind(job_id)
    .bind(new_completed)
    .bind(new_found)
    .bind(new_status)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(AggregateOutcome::Applied(updated))
}

/// Every Target row for `job_id`, LEFT JOINed against any Result row,
/// ordered lexicographically ascending on `hash_hex` — the shape the CSV
/// artifact is built from. Returns `None` if the job doesn't exist.
pub async fn fetch_targets_with_results(
    pool: &PgPool,
    job_id: Uuid,
) -> Result<Option<Vec<TargetWithResult>>, CoreError> {
    if get_job(pool, job_id).await?.is_none() {
        return Ok(None);
    }

    let rows = sqlx::query_as(
        "SELECT t.hash_hex AS hash_hex, r.preimage AS preimage
         FROM targets t
         LEFT JOIN results r ON r.job_id = t.job_id AND r.hash_hex = t.hash_hex
         WHERE t.job_id = $1
         ORDER BY t.hash_hex ASC",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(rows))
}
