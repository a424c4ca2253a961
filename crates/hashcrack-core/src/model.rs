//! Persisted row types for the `jobs`, `targets` and `results` relations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle state of a [`Job`]. A job in `Completed` never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Running,
    Completed,
}

/// A reverse-lookup job: the set of fingerprints a caller uploaded, and the
/// coordinator's running tally of how much of it has been resolved.
///
/// Serialized camelCase to match the rest of the service's wire convention
/// (`POST /api/jobs`'s `jobId`, the `progress` event's `batchesCompleted` /
/// `batchesExpected` / `foundCount`) — this row is returned verbatim by
/// `GET /api/jobs` and `GET /api/jobs/{id}` and embedded in the
/// `job_created` event payload, so it must match.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: JobStatus,
    pub total_hashes: i64,
    pub batches_expected: i32,
    pub batches_completed: i32,
    pub found_count: i64,
}

impl Job {
    /// `batches_expected = ceil(total_hashes / partition_size)`.
    pub fn batches_expected_for(total_hashes: i64, partition_size: i64) -> i32 {
        debug_assert!(partition_size > 0);
        (total_hashes.div_ceil(partition_size)) as i32
    }
}

/// A single resolved fingerprint, written by a minion on a cache hit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResultRow {
    pub job_id: Uuid,
    pub hash_hex: String,
    pub preimage: String,
    pub found_at: DateTime<Utc>,
}

/// A single row of the results CSV artifact: a requested fingerprint joined
/// against whatever was (or wasn't) found for it.
#[derive(Debug, Clone, FromRow)]
pub struct TargetWithResult {
    pub hash_hex: String,
    pub preimage: Option<String>,
}
