use anyhow::Result;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;

use crate::models::ServiceRequest;

/// Name of the export artifact for a given day: `civiclog_export_<ISO-date>.json`
pub fn export_filename(date: NaiveDate) -> String {
    format!("civiclog_export_{}.json", date.format("%Y-%m-%d"))
}

/// Writes the full collection as pretty-printed JSON to `output_path`
///
/// The export is the logbook's only durable exchange format and its de facto
/// backup mechanism; there is no import side.
pub fn export_json(requests: &[ServiceRequest], output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(requests)?;
    fs::write(output_path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use tempfile::tempdir;

    #[test]
    fn test_export_filename_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(export_filename(date), "civiclog_export_2024-03-07.json");
    }

    #[test]
    fn test_export_json_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("export.json");

        let requests = vec![
            ServiceRequest::new("Large pothole on Main St", "Pothole Repair", Some("SR-12345".into())),
            ServiceRequest::new("Streetlight out on Oak Avenue", "Streetlight Outage", None),
        ];

        export_json(&requests, &path)?;

        let raw = fs::read_to_string(&path)?;
        // pretty-printed, one field per line
        assert!(raw.contains("\n  "));

        let back: Vec<ServiceRequest> = serde_json::from_str(&raw)?;
        assert_eq!(back, requests);
        assert_eq!(back[0].current_status, Status::Submitted);

        Ok(())
    }
}
