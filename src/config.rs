//! Validated runtime configuration.
//!
//! [`Config::from_cli`] turns raw CLI/env input into a [`Config`] or a
//! [`ConfigError`]. Nothing touches the network until this has succeeded, so a
//! missing token never turns into an unauthenticated request.

use crate::aggregate::Mode;
use crate::api::MAX_PER_PAGE;
use crate::cli::Cli;
use crate::dates::DateRange;
use crate::error::ConfigError;
use std::time::Duration;
use url::Url;

#[derive(Clone)]
pub struct Config {
    pub access_token: String,
    pub base_url: Url,
    pub dates: DateRange,
    pub per_page: u32,
    pub concurrency: usize,
    pub mode: Mode,
    pub timeout: Duration,
    pub top: usize,
    pub refresh: Option<Duration>,
    pub json_output_dir: String,
    pub markdown_output_dir: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_token", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("dates", &self.dates.len())
            .field("per_page", &self.per_page)
            .field("concurrency", &self.concurrency)
            .field("mode", &self.mode)
            .field("timeout", &self.timeout)
            .field("top", &self.top)
            .field("refresh", &self.refresh)
            .finish()
    }
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let access_token = cli
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingAccessToken)?
            .to_string();

        if cli.per_page == 0 || cli.per_page > MAX_PER_PAGE {
            return Err(ConfigError::PerPageOutOfBounds {
                got: cli.per_page,
                max: MAX_PER_PAGE,
            });
        }
        if cli.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if cli.refresh_secs == Some(0) {
            return Err(ConfigError::ZeroRefresh);
        }

        let base_url = parse_base_url(&cli.base_url)?;

        let dates = match &cli.dates_file {
            Some(path) => DateRange::from_yaml_file(path)?,
            None => DateRange::inclusive(cli.start_date, cli.end_date)?,
        };

        let mode = if cli.counts_only {
            Mode::CountsOnly
        } else {
            Mode::Organizations
        };

        Ok(Self {
            access_token,
            base_url,
            dates,
            per_page: cli.per_page,
            concurrency: cli.concurrency,
            mode,
            timeout: Duration::from_secs(cli.timeout_secs.max(1)),
            top: cli.top,
            refresh: cli.refresh_secs.map(Duration::from_secs),
            json_output_dir: cli.json_output_dir.clone(),
            markdown_output_dir: cli.markdown_output_dir.clone(),
        })
    }
}

/// Parse the API base URL, making sure relative joins land under it.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash).map_err(|source| ConfigError::BaseUrl {
        url: raw.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(extra: &[&str]) -> Cli {
        let mut args = vec!["festa_monitor", "-j", "./json", "-m", "./markdown"];
        args.extend_from_slice(extra);
        Cli::parse_from(args)
    }

    fn without_token(mut cli: Cli) -> Cli {
        cli.access_token = None;
        cli
    }

    #[test]
    fn test_missing_token_is_a_config_error() {
        let err = Config::from_cli(&without_token(cli(&[]))).unwrap_err();
        assert!(matches!(err, ConfigError::MissingAccessToken));
    }

    #[test]
    fn test_blank_token_is_a_config_error() {
        let err = Config::from_cli(&cli(&["--access-token", "   "])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingAccessToken));
    }

    #[test]
    fn test_defaults_cover_the_festa_period() {
        let config = Config::from_cli(&cli(&["--access-token", "t"])).unwrap();
        assert_eq!(config.access_token, "t");
        assert_eq!(config.dates.len(), 38);
        assert_eq!(config.per_page, 100);
        assert_eq!(config.mode, Mode::Organizations);
        assert_eq!(config.base_url.as_str(), "https://qiita.com/api/v2/");
    }

    #[test]
    fn test_per_page_bounds() {
        let err = Config::from_cli(&cli(&["--access-token", "t", "--per-page", "101"])).unwrap_err();
        assert!(matches!(err, ConfigError::PerPageOutOfBounds { got: 101, max: 100 }));
        let err = Config::from_cli(&cli(&["--access-token", "t", "--per-page", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::PerPageOutOfBounds { got: 0, .. }));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = Config::from_cli(&cli(&["--access-token", "t", "--concurrency", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroConcurrency));
    }

    #[test]
    fn test_zero_refresh_rejected() {
        let err = Config::from_cli(&cli(&["--access-token", "t", "--refresh-secs", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroRefresh));
        let config = Config::from_cli(&cli(&["--access-token", "t"])).unwrap();
        assert_eq!(config.refresh, None);
    }

    #[test]
    fn test_inverted_window_rejected() {
        let err = Config::from_cli(&cli(&[
            "--access-token",
            "t",
            "--start-date",
            "2023-07-02",
            "--end-date",
            "2023-07-01",
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvertedDateRange { .. }));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = Config::from_cli(&cli(&[
            "--access-token",
            "t",
            "--base-url",
            "http://localhost:8080/api/v2",
        ]))
        .unwrap();
        assert_eq!(config.base_url.join("items").unwrap().as_str(), "http://localhost:8080/api/v2/items");
    }

    #[test]
    fn test_bad_base_url() {
        let err = Config::from_cli(&cli(&["--access-token", "t", "--base-url", "not a url"])).unwrap_err();
        assert!(matches!(err, ConfigError::BaseUrl { .. }));
    }

    #[test]
    fn test_counts_only_and_refresh() {
        let config = Config::from_cli(&cli(&[
            "--access-token",
            "t",
            "--counts-only",
            "--refresh-secs",
            "600",
        ]))
        .unwrap();
        assert_eq!(config.mode, Mode::CountsOnly);
        assert_eq!(config.refresh, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Config::from_cli(&cli(&["--access-token", "very-secret"])).unwrap();
        assert!(!format!("{:?}", config).contains("very-secret"));
    }
}
