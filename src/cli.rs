//! Command-line interface definitions for the festa monitor.
//!
//! All arguments can be provided via command-line flags or environment variables.

use crate::dates::{DEFAULT_END, DEFAULT_START};
use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for the festa monitor.
///
/// # Examples
///
/// ```sh
/// # One run over the default event period
/// QIITA_API_ACCESS_TOKEN=... festa_monitor -j ./json -m ./markdown
///
/// # A custom window, refreshed every ten minutes
/// festa_monitor -j ./json -m ./markdown --start-date 2023-07-01 --end-date 2023-07-07 --refresh-secs 600
///
/// # Only per-day totals, one request per day
/// festa_monitor -j ./json -m ./markdown --counts-only
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the JSON summary
    #[arg(short, long)]
    pub json_output_dir: String,

    /// Output directory for the Markdown report
    #[arg(short, long)]
    pub markdown_output_dir: String,

    /// Qiita API access token, sent as a bearer token
    #[arg(long, env = "QIITA_API_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Base URL of the Qiita API
    #[arg(long, env = "QIITA_API_BASE_URL", default_value = "https://qiita.com/api/v2/")]
    pub base_url: String,

    /// First date of the observation window (inclusive)
    #[arg(long, default_value = DEFAULT_START)]
    pub start_date: NaiveDate,

    /// Last date of the observation window (inclusive)
    #[arg(long, default_value = DEFAULT_END)]
    pub end_date: NaiveDate,

    /// YAML file with an explicit `dates:` list; overrides --start-date/--end-date
    #[arg(long)]
    pub dates_file: Option<String>,

    /// Items requested per page (upstream maximum is 100)
    #[arg(long, default_value_t = 100)]
    pub per_page: u32,

    /// Number of dates aggregated at the same time
    #[arg(long, default_value_t = 8)]
    pub concurrency: usize,

    /// Organizations listed per date in the Markdown report
    #[arg(long, default_value_t = 7)]
    pub top: usize,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Only fetch per-date totals (one request per date, no organization ranking)
    #[arg(long)]
    pub counts_only: bool,

    /// Re-run the aggregation every N seconds instead of exiting after one run
    #[arg(long, env = "FESTA_REFRESH_SECS")]
    pub refresh_secs: Option<u64>,
}
