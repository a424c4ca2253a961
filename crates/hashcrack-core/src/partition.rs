//! Partitioning of an admitted fingerprint list into bounded work units.

/// Split `fingerprints` into `ceil(len / partition_size)` chunks of at most
/// `partition_size` each, in original order. Batch indices are assigned
/// `0..K` left to right; publishing order downstream is not observable.
pub fn partition(fingerprints: &[String], partition_size: usize) -> Vec<(i32, Vec<String>)> {
    debug_assert!(partition_size > 0);
    fingerprints
        .chunks(partition_size)
        .enumerate()
        .map(|(i, chunk)| (i as i32, chunk.to_vec()))
        .collect()
}
