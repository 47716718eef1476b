//! Error types for configuration and upstream fetching.
//!
//! - [`ConfigError`]: invalid or missing settings; raised before any request is sent
//! - [`FetchError`]: anything that goes wrong while talking to the Qiita API
//!
//! Quota exhaustion is not special-cased beyond its own variant: it is a
//! transport-class failure and aborts the run like any other fetch error.

use thiserror::Error;

/// Configuration errors. Fatal; no fetch is attempted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("access token is missing (set --access-token or QIITA_API_ACCESS_TOKEN)")]
    MissingAccessToken,

    #[error("date range is empty")]
    EmptyDateRange,

    #[error("invalid date range: {start} is after {end}")]
    InvertedDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("duplicate date in range: {0}")]
    DuplicateDate(chrono::NaiveDate),

    #[error("per_page must be between 1 and {max}, got {got}")]
    PerPageOutOfBounds { got: u32, max: u32 },

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("refresh interval must be at least 1 second")]
    ZeroRefresh,

    #[error("invalid base URL {url}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to read dates file {path}: {source}")]
    DatesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dates file {path}: {source}")]
    DatesFileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Errors surfaced by a single page fetch. None of them are retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unauthorized: access token was rejected")]
    Unauthorized,

    #[error("rate limit exhausted (status {status})")]
    QuotaExhausted { status: u16 },

    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    Decode(String),
}
