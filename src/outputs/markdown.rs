//! Markdown report of the aggregated [`Summary`].
//!
//! The report has three parts:
//!
//! 1. Articles per day, each with its top organizations
//! 2. Articles per organization over the whole period
//! 3. The lowest `Rate-Remaining` seen during the run
//!
//! Organization names link to their page on Qiita.

use crate::models::{organization_url, Summary};
use std::error::Error;
use std::fmt::Write;
use tokio::fs;
use tracing::{info, instrument};

pub const SUMMARY_MD: &str = "summary.md";

/// Render `summary`, listing at most `top` organizations per day.
pub fn summary_to_markdown(summary: &Summary, top: usize) -> String {
    let mut md = String::new();

    writeln!(md, "# Qiita Engineer Festa Monitor\n").unwrap();
    writeln!(
        md,
        "_Generated at {}_\n",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
    .unwrap();

    writeln!(md, "## Articles per day and top {} organizations\n", top).unwrap();
    for day in &summary.dates {
        write!(md, "- {}: {}", day.date, day.total_count).unwrap();
        let shown: Vec<String> = day
            .scores
            .iter()
            .take(top)
            .map(|s| format!("[{}]({}): {}", s.organization, organization_url(&s.organization), s.count))
            .collect();
        if !shown.is_empty() {
            write!(md, " ({})", shown.join(", ")).unwrap();
        }
        md.push('\n');
    }
    md.push('\n');

    if !summary.organization_totals.is_empty() {
        writeln!(md, "## Articles per organization over the period\n").unwrap();
        for total in &summary.organization_totals {
            writeln!(
                md,
                "- [{}]({}): {}",
                total.organization,
                organization_url(&total.organization),
                total.total
            )
            .unwrap();
        }
        md.push('\n');
    }

    writeln!(md, "Rate-Remaining: {}", summary.rate_remaining_or_default()).unwrap();
    md
}

/// Write the report to `{markdown_output_dir}/summary.md`.
///
/// Like the JSON summary, the report goes to a temporary sibling first and is
/// renamed into place.
#[instrument(level = "info", skip_all, fields(%markdown_output_dir))]
pub async fn write_summary(
    summary: &Summary,
    markdown_output_dir: &str,
    top: usize,
) -> Result<String, Box<dyn Error>> {
    let md = summary_to_markdown(summary, top);
    fs::create_dir_all(markdown_output_dir).await?;
    let path = format!("{}/{}", markdown_output_dir.trim_end_matches('/'), SUMMARY_MD);
    let tmp_path = format!("{}.tmp", path);
    fs::write(&tmp_path, md).await?;
    fs::rename(&tmp_path, &path).await?;
    info!(path = %path, "Wrote Markdown report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateResult, OrganizationScore, OrganizationTotal};

    fn score(org: &str, count: u64) -> OrganizationScore {
        OrganizationScore { organization: org.into(), count }
    }

    fn summary() -> Summary {
        Summary {
            generated_at: "2023-07-01T12:00:00Z".parse().unwrap(),
            dates: vec![
                DateResult {
                    date: "2023-06-14".parse().unwrap(),
                    scores: vec![score("acme", 3), score("beta", 2), score("gamma", 1)],
                    total_count: 40,
                    rate_remaining: Some(950),
                },
                DateResult {
                    date: "2023-06-15".parse().unwrap(),
                    scores: vec![],
                    total_count: 0,
                    rate_remaining: Some(949),
                },
            ],
            organization_totals: vec![
                OrganizationTotal { organization: "acme".into(), total: 3 },
                OrganizationTotal { organization: "beta".into(), total: 2 },
            ],
            rate_remaining: Some(949),
        }
    }

    #[test]
    fn test_day_lines_respect_top() {
        let md = summary_to_markdown(&summary(), 2);
        assert!(md.contains(
            "- 2023-06-14: 40 ([acme](https://qiita.com/organizations/acme): 3, [beta](https://qiita.com/organizations/beta): 2)\n"
        ));
        assert!(!md.contains("[gamma]"));
        assert!(md.contains("- 2023-06-15: 0\n"));
    }

    #[test]
    fn test_totals_and_rate_remaining() {
        let md = summary_to_markdown(&summary(), 7);
        assert!(md.contains("## Articles per organization over the period"));
        assert!(md.contains("- [acme](https://qiita.com/organizations/acme): 3\n"));
        assert!(md.trim_end().ends_with("Rate-Remaining: 949"));
    }

    #[test]
    fn test_missing_rate_remaining_renders_zero() {
        let mut s = summary();
        s.rate_remaining = None;
        s.organization_totals.clear();
        let md = summary_to_markdown(&s, 7);
        assert!(md.contains("Rate-Remaining: 0"));
        assert!(!md.contains("Articles per organization"));
    }

    #[tokio::test]
    async fn test_write_summary_replaces_report_atomically() {
        let dir = std::env::temp_dir().join(format!("festa_monitor_md_{}", std::process::id()));
        let dir_str = dir.to_str().unwrap().to_string();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(SUMMARY_MD), "stale report").unwrap();

        let path = write_summary(&summary(), &dir_str, 7).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, summary_to_markdown(&summary(), 7));
        assert!(!std::path::Path::new(&format!("{path}.tmp")).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
