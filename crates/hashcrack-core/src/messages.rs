//! Wire messages exchanged over the `work` and `results` queues.
//!
//! Both are tagged enums so the schema can grow new variants without
//! breaking consumers mid-rollout, the same discriminated-union shape the
//! rest of the pack uses for queue payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Published by the coordinator on the `work` subject; consumed by minions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkUnit {
    Batch {
        job_id: Uuid,
        batch_index: i32,
        fingerprints: Vec<String>,
    },
}

/// Published by a minion on the `results` subject; consumed by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResultEnvelope {
    Batch {
        job_id: Uuid,
        batch_index: i32,
        hits: Vec<Hit>,
    },
}

/// A single fingerprint/preimage match discovered while processing a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    pub fingerprint: String,
    pub preimage: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_unit_roundtrip() {
        let unit = WorkUnit::Batch {
            job_id: Uuid::nil(),
            batch_index: 3,
            fingerprints: vec!["a".repeat(32)],
        };
        let json = serde_json::to_string(&unit).unwrap();
        assert!(json.contains(r#""type":"Batch""#));
        let back: WorkUnit = serde_json::from_str(&json).unwrap();
        match back {
            WorkUnit::Batch {
                batch_index,
                fingerprints,
                ..
            } => {
                assert_eq!(batch_index, 3);
                assert_eq!(fingerprints.len(), 1);
            }
        }
    }

    #[test]
    fn result_envelope_roundtrip_empty_hits() {
        let env = ResultEnvelope::Batch {
            job_id: Uuid::nil(),
            batch_index: 0,
            hits: vec![],
        };
        let json = serde_json::to_string(&env).unwrap();
        let back: ResultEnvelope = serde_json::from_str(&json).unwrap();
        match back {
            ResultEnvelope::Batch { hits, .. } => assert!(hits.is_empty()),
        }
    }

    #[test]
    fn hit_carries_fingerprint_and_preimage() {
        let hit = Hit {
            fingerprint: "f".repeat(32),
            preimage: "050-1234567".to_string(),
        };
        let json = serde_json::to_string(&hit).unwrap();
        let back: Hit = serde_json::from_str(&json).unwrap();
        assert_eq!(back.preimage, "050-1234567");
    }
}
