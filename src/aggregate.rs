//! Per-date pagination, per-organization tallies, and the cross-date report.
//!
//! # Pipeline
//!
//! 1. **Pages**: for one date, pages are requested in increasing order until
//!    either an empty page comes back or `page * per_page >= Total-Count`.
//!    Either condition alone ends the loop, so a stale or inconsistent total
//!    cannot cause unbounded fetching.
//! 2. **Per-date fold**: the page stream is folded into a [`Tally`] of
//!    organization counts plus the latest `Total-Count` and `Rate-Remaining`.
//! 3. **Cross-date reduce**: [`summarize`] sums organizations across dates and
//!    takes the minimum quota observed.
//!
//! Dates are independent and run concurrently; pages of one date never do.
//! Any fetch error aborts the whole run, so renderers never see a partial
//! [`Summary`].

use crate::api::{PageSource, MAX_PER_PAGE};
use crate::dates::DateRange;
use crate::error::FetchError;
use crate::models::{DateResult, OrganizationScore, OrganizationTotal, PageResult, Summary};
use chrono::{DateTime, NaiveDate, Utc};
use futures::future;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use itertools::Itertools;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Default number of dates aggregated at the same time.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// What to collect for each date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Page through every item and tally organizations.
    #[default]
    Organizations,
    /// One `per_page = 1` request per date; totals and quota only.
    CountsOnly,
}

/// Organization counts that remember first-seen order.
///
/// Ranking sorts by count only, with a stable sort, so equal counts keep the
/// order in which organizations were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    order: Vec<String>,
    counts: HashMap<String, u64>,
}

impl Tally {
    pub fn add(mut self, organization: &str, n: u64) -> Self {
        match self.counts.get_mut(organization) {
            Some(count) => *count += n,
            None => {
                self.order.push(organization.to_owned());
                self.counts.insert(organization.to_owned(), n);
            }
        }
        self
    }

    /// `(organization, count)` pairs, highest count first.
    pub fn ranked(self) -> Vec<(String, u64)> {
        let Tally { order, mut counts } = self;
        order
            .into_iter()
            .map(|organization| {
                let count = counts.remove(&organization).unwrap_or(0);
                (organization, count)
            })
            .sorted_by(|a, b| b.1.cmp(&a.1))
            .collect()
    }
}

/// Accumulator for one date's page stream.
#[derive(Debug, Default)]
struct DateTally {
    organizations: Tally,
    total_count: u64,
    rate_remaining: Option<u64>,
    pages: u32,
}

impl DateTally {
    fn absorb(self, page: PageResult) -> Self {
        // A page without the header does not erase what was already seen.
        let rate_remaining = page.rate_remaining.or(self.rate_remaining);
        if page.items.is_empty() {
            return Self {
                rate_remaining,
                pages: self.pages + 1,
                ..self
            };
        }
        let organizations = page
            .items
            .iter()
            .filter_map(|item| item.organization_url_name.as_deref())
            .fold(self.organizations, |tally, org| tally.add(org, 1));
        Self {
            organizations,
            total_count: page.total_count,
            rate_remaining,
            pages: self.pages + 1,
        }
    }

    fn finish(self, date: NaiveDate) -> DateResult {
        let scores = self
            .organizations
            .ranked()
            .into_iter()
            .map(|(organization, count)| OrganizationScore {
                organization,
                count,
            })
            .collect();
        DateResult {
            date,
            scores,
            total_count: self.total_count,
            rate_remaining: self.rate_remaining,
        }
    }
}

/// Fetch one page and decide which page, if any, comes next.
async fn next_page<S: PageSource>(
    source: &S,
    date: NaiveDate,
    per_page: u32,
    page: Option<u32>,
) -> Result<Option<(PageResult, Option<u32>)>, FetchError> {
    let Some(page) = page else {
        return Ok(None);
    };
    let result = source.fetch_page(page, per_page, date).await?;
    if result.items.is_empty() {
        // Still yielded so its quota reading is kept; its total is not.
        debug!(page, "Empty page; no more results");
        return Ok(Some((result, None)));
    }
    let fetched = u64::from(page) * u64::from(per_page);
    let next = if fetched >= result.total_count {
        None
    } else {
        page.checked_add(1)
    };
    debug!(page, fetched, total_count = result.total_count, ?next, "Page fetched");
    Ok(Some((result, next)))
}

/// Pages of `date` in order, ending after the first empty page at the latest.
fn pages<'a, S: PageSource>(
    source: &'a S,
    date: NaiveDate,
    per_page: u32,
) -> impl Stream<Item = Result<PageResult, FetchError>> + 'a {
    stream::try_unfold(Some(1u32), move |page| {
        next_page(source, date, per_page, page)
    })
}

/// Page through every item created on `date` and tally organizations.
///
/// Items without an organization are skipped by the tally but still counted
/// in `total_count`, which comes from the upstream `Total-Count` header.
#[instrument(level = "info", skip_all, fields(%date, per_page = per_page))]
pub async fn aggregate_date<S: PageSource>(
    source: &S,
    date: NaiveDate,
    per_page: u32,
) -> Result<DateResult, FetchError> {
    let tally = pages(source, date, per_page)
        .try_fold(DateTally::default(), |tally, page| {
            future::ready(Ok(tally.absorb(page)))
        })
        .await?;

    let page_count = tally.pages;
    let result = tally.finish(date);
    info!(
        pages = page_count,
        total_count = result.total_count,
        attributed = result.attributed_count(),
        organizations = result.scores.len(),
        rate_remaining = ?result.rate_remaining,
        "Aggregated date"
    );
    Ok(result)
}

/// Read `Total-Count` and `Rate-Remaining` for `date` with a single request.
#[instrument(level = "info", skip_all, fields(%date))]
pub async fn count_date<S: PageSource>(source: &S, date: NaiveDate) -> Result<DateResult, FetchError> {
    let page = source.fetch_page(1, 1, date).await?;
    info!(
        total_count = page.total_count,
        rate_remaining = ?page.rate_remaining,
        "Counted date"
    );
    Ok(DateResult {
        date,
        scores: Vec::new(),
        total_count: page.total_count,
        rate_remaining: page.rate_remaining,
    })
}

/// Smallest quota observed. Dates that never saw the header are left out.
pub fn min_rate_remaining(dates: &[DateResult]) -> Option<u64> {
    dates.iter().filter_map(|d| d.rate_remaining).min()
}

/// Sum each organization's counts across all dates, highest total first.
pub fn rank_organizations(dates: &[DateResult]) -> Vec<OrganizationTotal> {
    dates
        .iter()
        .flat_map(|d| d.scores.iter())
        .fold(Tally::default(), |tally, score| {
            tally.add(&score.organization, score.count)
        })
        .ranked()
        .into_iter()
        .map(|(organization, total)| OrganizationTotal {
            organization,
            total,
        })
        .collect()
}

/// Reduce per-date results into the final report.
pub fn summarize(dates: Vec<DateResult>, generated_at: DateTime<Utc>) -> Summary {
    let rate_remaining = min_rate_remaining(&dates);
    let organization_totals = rank_organizations(&dates);
    Summary {
        generated_at,
        dates,
        organization_totals,
        rate_remaining,
    }
}

/// Runs the whole date range against one [`PageSource`].
#[derive(Debug)]
pub struct Aggregator<S> {
    source: S,
    range: DateRange,
    per_page: u32,
    concurrency: usize,
    mode: Mode,
}

impl<S: PageSource> Aggregator<S> {
    pub fn new(source: S, range: DateRange) -> Self {
        Self {
            source,
            range,
            per_page: MAX_PER_PAGE,
            concurrency: DEFAULT_CONCURRENCY,
            mode: Mode::default(),
        }
    }

    /// Values outside `1..=MAX_PER_PAGE` are clamped, so an `Aggregator`
    /// never sends a `per_page` the upstream would reject. `Config::from_cli`
    /// refuses such values before they get here.
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    /// At least one date is always in flight; `0` is raised to `1`.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// One [`DateResult`] per configured date, in configured order.
    ///
    /// The first failing date aborts the run; remaining in-flight dates are
    /// dropped.
    #[instrument(level = "info", skip_all, fields(dates = self.range.len(), per_page = self.per_page, mode = ?self.mode))]
    pub async fn collect_dates(&self) -> Result<Vec<DateResult>, FetchError> {
        let source = &self.source;
        let per_page = self.per_page;
        let mode = self.mode;
        stream::iter(self.range.iter())
            .map(|date| async move {
                match mode {
                    Mode::Organizations => aggregate_date(source, date, per_page).await,
                    Mode::CountsOnly => count_date(source, date).await,
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    /// Collect every date and reduce into a [`Summary`].
    pub async fn run(&self) -> Result<Summary, FetchError> {
        let dates = self.collect_dates().await?;
        let summary = summarize(dates, Utc::now());
        info!(
            dates = summary.dates.len(),
            articles = summary.article_count(),
            organizations = summary.organization_totals.len(),
            rate_remaining = ?summary.rate_remaining,
            "Aggregation complete"
        );
        Ok(summary)
    }
}
