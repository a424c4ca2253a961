//! CSV result artifact generation.

use hashcrack_core::TargetWithResult;

const NOT_FOUND: &str = "NOT FOUND";

/// Render target/result rows as `hash,phone` CSV text. Regenerated on every
/// request; targets are fixed at job creation but results grow
/// monotonically, so a call before completion returns a partial snapshot —
/// documented behavior, not an error.
pub fn render_csv(rows: &[TargetWithResult]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(["hash", "phone"])?;
    for row in rows {
        let preimage = row.preimage.as_deref().unwrap_or(NOT_FOUND);
        writer.write_record([row.hash_hex.as_str(), preimage])?;
    }
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(hash: &str, preimage: Option<&str>) -> TargetWithResult {
        TargetWithResult {
            hash_hex: hash.to_string(),
            preimage: preimage.map(str::to_string),
        }
    }

    #[test]
    fn header_only_for_empty_job() {
        let csv = render_csv(&[]).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "hash,phone\n");
    }

    #[test]
    fn missing_results_render_as_not_found() {
        let rows = vec![
            row(&"a".repeat(32), Some("050-1234567")),
            row(&"b".repeat(32), None),
        ];
        let csv = String::from_utf8(render_csv(&rows).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "hash,phone");
        assert_eq!(lines.next().unwrap(), format!("{},050-1234567", "a".repeat(32)));
        assert_eq!(lines.next().unwrap(), format!("{},NOT FOUND", "b".repeat(32)));
        assert!(lines.next().is_none());
    }
}
