//! Fingerprint parsing and hex/binary conversion.
//!
//! A fingerprint is a 32-hex-character (16 byte) content identifier. This
//! module owns the one admission rule the whole system agrees on: a line is
//! a fingerprint if and only if it is exactly 32 hex characters after
//! trimming whitespace.

use crate::error::CoreError;

pub const FINGERPRINT_HEX_LEN: usize = 32;

/// Returns `true` if `line` (after trimming) is a well-formed 32-hex-char
/// fingerprint.
pub fn is_fingerprint(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() == FINGERPRINT_HEX_LEN && trimmed.bytes().all(|b| b.is_ascii_hexdigit())
}

/// The outcome of scanning a line-delimited upload: every admitted
/// fingerprint in input order (duplicates kept — `N` counts lines, not
/// distinct values; the Target table collapses duplicates at insert time
/// via its primary key) and how many non-blank lines were rejected.
pub struct ParsedInput {
    pub fingerprints: Vec<String>,
    pub dropped_lines: u64,
}

/// Parse line-delimited text into admitted fingerprints plus a dropped-line
/// count. Blank lines are silently ignored and not counted as dropped —
/// they carry no user intent to resolve anything.
pub fn parse_lines(input: &str) -> ParsedInput {
    let mut fingerprints = Vec::new();
    let mut dropped_lines = 0u64;

    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if is_fingerprint(trimmed) {
            fingerprints.push(trimmed.to_ascii_lowercase());
        } else {
            dropped_lines += 1;
        }
    }

    ParsedInput {
        fingerprints,
        dropped_lines,
    }
}

/// Decode a fingerprint into its 16-byte binary form. Fails on anything that
/// isn't exactly 32 hex characters — a work unit can arrive off the broker
/// already malformed (a bad replay, a schema mismatch), so this returns a
/// `CoreError` instead of panicking the consumer task; callers nak and let
/// the broker redeliver rather than unwrapping.
pub fn to_bytes(hex: &str) -> Result<[u8; 16], CoreError> {
    if !is_fingerprint(hex) {
        return Err(CoreError::Invariant(format!(
            "not a 32-hex-char fingerprint: {hex:?}"
        )));
    }
    let decoded = hex::decode(hex).map_err(|e| CoreError::Invariant(e.to_string()))?;
    decoded
        .try_into()
        .map_err(|_| CoreError::Invariant("fingerprint did not decode to 16 bytes".to_string()))
}

/// Encode a 16-byte binary fingerprint back into lowercase 32-hex form.
pub fn to_hex(bytes: &[u8; 16]) -> String {
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_32_hex_chars() {
        assert!(is_fingerprint(&"a1".repeat(16)));
        assert!(is_fingerprint(&"ABCDEF0123456789abcdef0123456789".to_string()));
    }

    #[test]
    fn rejects_wrong_length_or_non_hex() {
        assert!(!is_fingerprint("short"));
        assert!(!is_fingerprint(&"a".repeat(31)));
        assert!(!is_fingerprint(&"a".repeat(33)));
        assert!(!is_fingerprint(&"g".repeat(32)));
        assert!(!is_fingerprint(""));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let line = format!("  {}  \r", "a".repeat(32));
        assert!(is_fingerprint(&line));
    }

    #[test]
    fn parse_lines_mixed_valid_and_invalid() {
        let input = "a1b2c3d4e5f6789012345678901234ab\nshort\n1234567890abcdef1234567890abcdef\n\ntoolonghash1234567890123456789012345\nfedcba0987654321fedcba0987654321";
        let parsed = parse_lines(input);
        assert_eq!(parsed.fingerprints.len(), 3);
        assert_eq!(parsed.dropped_lines, 2);
    }

    #[test]
    fn parse_lines_keeps_duplicates_for_batching() {
        // N counts lines, not distinct values — dedup happens later at the
        // Target table's primary key, not during parsing.
        let fp = "a".repeat(32);
        let input = format!("{fp}\n{fp}\n{}", "b".repeat(32));
        let parsed = parse_lines(&input);
        assert_eq!(parsed.fingerprints, vec![fp.clone(), fp, "b".repeat(32)]);
        assert_eq!(parsed.dropped_lines, 0);
    }

    #[test]
    fn parse_lines_all_blank_yields_empty_job() {
        let parsed = parse_lines("\n\n   \n");
        assert!(parsed.fingerprints.is_empty());
        assert_eq!(parsed.dropped_lines, 0);
    }

    #[test]
    fn hex_bytes_roundtrip() {
        let fp = "0123456789abcdeffedcba9876543210";
        let bytes = to_bytes(fp).unwrap();
        assert_eq!(to_hex(&bytes), fp);
    }

    #[test]
    fn to_bytes_rejects_malformed_input() {
        assert!(to_bytes("short").is_err());
        assert!(to_bytes(&"g".repeat(32)).is_err());
    }
}
