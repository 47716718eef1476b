//! JSON output of the aggregated [`Summary`].
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── summary.json
//! ```
//!
//! The file is written to a temporary sibling first and then renamed, so a
//! reader polling the directory never sees a half-written document.

use crate::models::Summary;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

pub const SUMMARY_JSON: &str = "summary.json";

/// Serialize `summary` (pretty-printed).
pub fn summary_to_json(summary: &Summary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}

/// Write a [`Summary`] to `{json_output_dir}/summary.json`.
///
/// # Returns
///
/// The path written, or an error if directory creation or file writing fails.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_summary(summary: &Summary, json_output_dir: &str) -> Result<String, Box<dyn Error>> {
    let json = summary_to_json(summary)?;

    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(%json_output_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let dir = json_output_dir.trim_end_matches('/');
    let output_json_filename = format!("{}/{}", dir, SUMMARY_JSON);
    let tmp_filename = format!("{}.tmp", output_json_filename);

    fs::write(&tmp_filename, json).await?;
    fs::rename(&tmp_filename, &output_json_filename).await?;
    info!(path = %output_json_filename, dates = summary.dates.len(), "Wrote JSON summary");

    Ok(output_json_filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateResult, OrganizationScore, OrganizationTotal};

    fn summary() -> Summary {
        Summary {
            generated_at: "2023-07-01T00:00:00Z".parse().unwrap(),
            dates: vec![DateResult {
                date: "2023-06-14".parse().unwrap(),
                scores: vec![OrganizationScore { organization: "acme".into(), count: 2 }],
                total_count: 5,
                rate_remaining: Some(900),
            }],
            organization_totals: vec![OrganizationTotal { organization: "acme".into(), total: 2 }],
            rate_remaining: Some(900),
        }
    }

    #[test]
    fn test_summary_to_json_fields() {
        let json = summary_to_json(&summary()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["dates"][0]["date"], "2023-06-14");
        assert_eq!(value["dates"][0]["total_count"], 5);
        assert_eq!(value["organization_totals"][0]["organization"], "acme");
        assert_eq!(value["rate_remaining"], 900);
    }

    #[tokio::test]
    async fn test_write_summary_creates_file() {
        let dir = std::env::temp_dir().join(format!("festa_monitor_json_{}", std::process::id()));
        let dir_str = dir.to_str().unwrap().to_string();

        let path = write_summary(&summary(), &dir_str).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let back: Summary = serde_json::from_str(&written).unwrap();
        assert_eq!(back, summary());
        assert!(!std::path::Path::new(&format!("{path}.tmp")).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
