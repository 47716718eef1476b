//! # Festa Monitor
//!
//! Watches Qiita over a fixed event period and reports how many articles were
//! posted each day and which organizations posted them.
//!
//! ## Features
//!
//! - Pages through the Qiita `GET /items` search for every date in the window
//! - Tallies articles per organization per day and over the whole period
//! - Tracks the API's `Rate-Remaining` quota across every call
//! - Outputs a JSON summary and a Markdown report
//! - Optionally re-runs on a fixed interval, keeping the last good output
//!
//! ## Usage
//!
//! ```sh
//! QIITA_API_ACCESS_TOKEN=... festa_monitor -j ./json -m ./markdown
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: CLI/env input validated into a `Config`
//! 2. **Aggregation**: dates fetched concurrently, pages of a date sequentially
//! 3. **Reduction**: per-organization totals and the minimum quota
//! 4. **Output**: JSON and Markdown files, rewritten on every successful run

use clap::Parser;
use std::error::Error;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod aggregate;
mod api;
mod cli;
mod config;
mod dates;
mod error;
mod models;
mod outputs;
mod utils;

use aggregate::Aggregator;
use api::{PageSource, QiitaClient};
use cli::Cli;
use config::Config;
use models::Summary;
use outputs::{json, markdown};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("festa_monitor starting up");

    let args = Cli::parse();
    debug!(?args.json_output_dir, ?args.markdown_output_dir, "Parsed CLI arguments");

    let config = match Config::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration; no requests will be sent");
            return Err(e.into());
        }
    };
    info!(?config, "Loaded configuration");

    // Early check: both output dirs must be writable before spending quota
    for dir in [&config.json_output_dir, &config.markdown_output_dir] {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let client = QiitaClient::new(&config.base_url, config.access_token.clone(), config.timeout)?;
    info!(
        endpoint = %client.items_url(),
        first_date = ?config.dates.dates().first(),
        last_date = ?config.dates.dates().last(),
        "Qiita client ready"
    );
    let aggregator = Aggregator::new(client, config.dates.clone())
        .per_page(config.per_page)
        .concurrency(config.concurrency)
        .mode(config.mode);

    match config.refresh {
        None => {
            if let Err(e) = run_once(&aggregator, &config).await {
                error!(error = %e, "Run failed; nothing was written");
                return Err(e);
            }
        }
        Some(period) => refresh_loop(&aggregator, &config, period).await,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// One aggregation followed by both outputs. Nothing is written unless the
/// aggregation of every date succeeded.
#[instrument(level = "info", skip_all)]
async fn run_once<S: PageSource>(
    aggregator: &Aggregator<S>,
    config: &Config,
) -> Result<Summary, Box<dyn Error>> {
    let t0 = Instant::now();
    let summary = aggregator.run().await?;

    json::write_summary(&summary, &config.json_output_dir).await?;
    markdown::write_summary(&summary, &config.markdown_output_dir, config.top).await?;

    info!(
        elapsed_ms = t0.elapsed().as_millis() as u64,
        articles = summary.article_count(),
        rate_remaining = summary.rate_remaining_or_default(),
        "Published summary"
    );
    Ok(summary)
}

/// Re-run every `period` until Ctrl-C. A failed run keeps the previous outputs.
#[instrument(level = "info", skip_all, fields(period_secs = period.as_secs()))]
async fn refresh_loop<S: PageSource>(aggregator: &Aggregator<S>, config: &Config, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut runs = 0u64;
    let mut failures = 0u64;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = interval.tick() => {}
        }
        runs += 1;
        tokio::select! {
            _ = &mut shutdown => {
                warn!(run = runs, "Shutdown requested; abandoning in-flight run");
                break;
            }
            res = run_once(aggregator, config) => match res {
                Ok(_) => info!(run = runs, "Refresh succeeded"),
                Err(e) => {
                    failures += 1;
                    warn!(run = runs, failures, error = %e, "Refresh failed; keeping previous outputs");
                }
            }
        }
    }
    info!(runs, failures, "Refresh loop stopped");
}
