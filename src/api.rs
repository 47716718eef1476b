//! Paged access to the Qiita `GET /items` search endpoint.
//!
//! # Architecture
//!
//! - [`PageSource`]: trait for "fetch page N of date D"; the aggregator only
//!   ever talks to this trait
//! - [`QiitaClient`]: the reqwest-backed implementation
//!
//! # Response headers
//!
//! Every response carries two counters the monitor cares about:
//!
//! | Header | Meaning | When absent |
//! |--------|---------|-------------|
//! | `Total-Count` | items matching the query | `0` (pagination stops) |
//! | `Rate-Remaining` | calls left in the current window | `None` |
//!
//! No retries are attempted. A failed page is a failed date.

use crate::error::{ConfigError, FetchError};
use crate::models::{Item, PageResult};
use crate::utils::truncate_for_log;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

/// Largest `per_page` the upstream accepts.
pub const MAX_PER_PAGE: u32 = 100;

pub const TOTAL_COUNT_HEADER: &str = "Total-Count";
pub const RATE_REMAINING_HEADER: &str = "Rate-Remaining";

/// Something that can return one page of items created on one date.
///
/// Implementations must not retry and must not keep state between calls.
pub trait PageSource {
    /// Fetch page `page` (1-based) of the items created on `date`.
    async fn fetch_page(
        &self,
        page: u32,
        per_page: u32,
        date: NaiveDate,
    ) -> Result<PageResult, FetchError>;
}

/// Search expression restricting results to a single creation date.
pub fn date_query(date: NaiveDate) -> String {
    let day = date.format("%Y-%m-%d");
    format!("created:>={day} created:<={day}")
}

/// Parse a numeric header. Absent or non-numeric values yield `None`.
pub fn header_count(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// reqwest-backed [`PageSource`] for the Qiita API v2.
#[derive(Clone)]
pub struct QiitaClient {
    http: Client,
    items_url: Url,
    access_token: String,
}

impl std::fmt::Debug for QiitaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QiitaClient")
            .field("items_url", &self.items_url.as_str())
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl QiitaClient {
    /// Build a client against `base_url` (for example `https://qiita.com/api/v2/`).
    ///
    /// The token is sent as-is in a bearer `Authorization` header.
    pub fn new(
        base_url: &Url,
        access_token: String,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let items_url = base_url
            .join("items")
            .map_err(|source| ConfigError::BaseUrl {
                url: base_url.to_string(),
                source,
            })?;
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(Self {
            http,
            items_url,
            access_token,
        })
    }

    pub fn items_url(&self) -> &Url {
        &self.items_url
    }
}

impl PageSource for QiitaClient {
    #[instrument(level = "debug", skip(self, date), fields(%date))]
    async fn fetch_page(
        &self,
        page: u32,
        per_page: u32,
        date: NaiveDate,
    ) -> Result<PageResult, FetchError> {
        let t0 = Instant::now();
        let response = self
            .http
            .get(self.items_url.clone())
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .query(&[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
                ("query", date_query(date)),
            ])
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let rate_remaining = header_count(&headers, RATE_REMAINING_HEADER);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                ?rate_remaining,
                body = %truncate_for_log(&body, 300),
                "Qiita API returned an error status"
            );
            return Err(match status {
                StatusCode::UNAUTHORIZED => FetchError::Unauthorized,
                StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                    FetchError::QuotaExhausted {
                        status: status.as_u16(),
                    }
                }
                _ => FetchError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let body = response.text().await?;
        let items: Vec<Item> = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, body = %truncate_for_log(&body, 300), "Undecodable items body");
            FetchError::Decode(e.to_string())
        })?;

        let total_count = match header_count(&headers, TOTAL_COUNT_HEADER) {
            Some(n) => n,
            None => {
                warn!("Response had no usable Total-Count header; assuming 0");
                0
            }
        };

        debug!(
            items = items.len(),
            total_count,
            ?rate_remaining,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );

        Ok(PageResult {
            items,
            total_count,
            rate_remaining,
        })
    }
}
