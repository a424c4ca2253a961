//! Batch lookup against the fingerprint-to-preimage mapping table.

use anyhow::Result;
use hashcrack_core::{fingerprint, Hit, ResultEnvelope, WorkUnit};
use sqlx::PgPool;
use sqlx::Row;

use crate::queue::QueueClient;

/// Resolve one batch: decode its fingerprints, look them up, persist any
/// hits, and publish the result envelope.
pub async fn handle_work_unit(pool: &PgPool, queue: &QueueClient, unit: WorkUnit) -> Result<()> {
    let WorkUnit::Batch {
        job_id,
        batch_index,
        fingerprints,
    } = unit;

    let needles: Vec<Vec<u8>> = fingerprints
        .iter()
        .map(|f| fingerprint::to_bytes(f).map(|b| b.to_vec()))
        .collect::<Result<_, _>>()?;

    let rows = sqlx::query(
        "SELECT md5_hash, phone_number FROM md5_phone_map_bin WHERE md5_hash = ANY($1)",
    )
    .bind(&needles)
    .fetch_all(pool)
    .await?;

    let hits: Vec<Hit> = rows
        .iter()
        .map(|row| {
            let hash_bytes: Vec<u8> = row.get("md5_hash");
            let hash_array: [u8; 16] = hash_bytes
                .try_into()
                .expect("md5_phone_map_bin.md5_hash is always 16 bytes");
            let preimage: String = row.get("phone_number");
            Hit {
                fingerprint: fingerprint::to_hex(&hash_array),
                preimage,
            }
        })
        .collect();

    if !hits.is_empty() {
        persist_hits(pool, job_id, &hits).await?;
    }

    let envelope = ResultEnvelope::Batch {
        job_id,
        batch_index,
        hits,
    };
    queue.publish_result(&envelope).await?;

    Ok(())
}

/// Idempotent result insert: a redelivered batch re-lookups and re-inserts
/// the same hits, which the primary key collapses into no-ops.
async fn persist_hits(pool: &PgPool, job_id: uuid::Uuid, hits: &[Hit]) -> Result<()> {
    let job_ids = vec![job_id; hits.len()];
    let hashes: Vec<String> = hits.iter().map(|h| h.fingerprint.clone()).collect();
    let preimages: Vec<String> = hits.iter().map(|h| h.preimage.clone()).collect();

    sqlx::query(
        "INSERT INTO results (job_id, hash_hex, preimage)
         SELECT * FROM UNNEST($1::uuid[], $2::text[], $3::text[])
         ON CONFLICT (job_id, hash_hex) DO NOTHING",
    )
    .bind(&job_ids)
    .bind(&hashes)
    .bind(&preimages)
    .execute(pool)
    .await?;

    Ok(())
}
