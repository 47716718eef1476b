//! Data models for upstream articles and the aggregated report.
//!
//! - [`Item`], [`User`]: article records exactly as the Qiita API returns them
//! - [`PageResult`]: one page of items plus the count and quota headers
//! - [`DateResult`], [`OrganizationScore`]: one date's tally
//! - [`Summary`], [`OrganizationTotal`]: the cross-date report handed to outputs

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Base URL of an organization's page on Qiita.
pub const ORGANIZATION_BASE_URL: &str = "https://qiita.com/organizations";

/// An article record received from `GET /items`.
///
/// Only the fields the monitor reads are modelled; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Item {
    pub id: String,
    pub url: String,
    pub created_at: DateTime<FixedOffset>,
    /// `None` when the author posted independently.
    pub organization_url_name: Option<String>,
    pub user: User,
}

/// Article author.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub permanent_id: u64,
    pub id: String,
    pub name: String,
}

/// One page of results plus the two response-header signals.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub items: Vec<Item>,
    /// Value of `Total-Count`; 0 when the header is absent or unparsable.
    pub total_count: u64,
    /// Value of `Rate-Remaining`; `None` when the header is absent.
    pub rate_remaining: Option<u64>,
}

/// Articles attributed to one organization on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationScore {
    pub organization: String,
    pub count: u64,
}

/// Outcome of aggregating every page of one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateResult {
    pub date: NaiveDate,
    /// Sorted descending by count.
    pub scores: Vec<OrganizationScore>,
    pub total_count: u64,
    /// Quota observed after the date's last page fetch.
    pub rate_remaining: Option<u64>,
}

impl DateResult {
    /// Articles on this date that carry an organization.
    pub fn attributed_count(&self) -> u64 {
        self.scores.iter().map(|s| s.count).sum()
    }
}

/// Articles attributed to one organization over the whole date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationTotal {
    pub organization: String,
    pub total: u64,
}

/// The full report for one run. Read-only for renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub generated_at: DateTime<Utc>,
    /// One entry per configured date, in configured order.
    pub dates: Vec<DateResult>,
    /// Sorted descending by total.
    pub organization_totals: Vec<OrganizationTotal>,
    /// Minimum quota observed over the run, `None` if no response carried it.
    pub rate_remaining: Option<u64>,
}

impl Summary {
    /// Quota for display; a run that never saw the header reports 0.
    pub fn rate_remaining_or_default(&self) -> u64 {
        self.rate_remaining.unwrap_or(0)
    }

    /// Sum of all per-date totals.
    pub fn article_count(&self) -> u64 {
        self.dates.iter().map(|d| d.total_count).sum()
    }
}

/// Link to an organization's page on Qiita.
pub fn organization_url(organization: &str) -> String {
    format!("{}/{}", ORGANIZATION_BASE_URL, organization)
}
