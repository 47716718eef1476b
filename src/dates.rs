//! The observation window: an ordered list of calendar dates.
//!
//! A [`DateRange`] is built either from an inclusive `start..=end` span or from
//! an explicit list (typically loaded from a YAML file). The order given is
//! the order results are reported in.

use crate::error::ConfigError;
use chrono::{Days, NaiveDate};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, instrument};

/// First day of Qiita Engineer Festa 2023.
pub const DEFAULT_START: &str = "2023-06-14";
/// Last day of Qiita Engineer Festa 2023.
pub const DEFAULT_END: &str = "2023-07-21";

/// Non-empty, duplicate-free, ordered list of dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    dates: Vec<NaiveDate>,
}

/// Shape of a dates file:
///
/// ```yaml
/// dates:
///   - 2023-06-14
///   - 2023-06-15
/// ```
#[derive(Debug, Deserialize)]
struct DatesFile {
    dates: Vec<NaiveDate>,
}

impl DateRange {
    /// Every day from `start` to `end`, both inclusive.
    pub fn inclusive(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvertedDateRange { start, end });
        }
        let mut dates = Vec::new();
        let mut day = start;
        while day <= end {
            dates.push(day);
            match day.checked_add_days(Days::new(1)) {
                Some(next) => day = next,
                None => break,
            }
        }
        Self::from_dates(dates)
    }

    /// An explicit list; order is preserved.
    pub fn from_dates(dates: Vec<NaiveDate>) -> Result<Self, ConfigError> {
        if dates.is_empty() {
            return Err(ConfigError::EmptyDateRange);
        }
        let mut seen = HashSet::with_capacity(dates.len());
        for date in &dates {
            if !seen.insert(*date) {
                return Err(ConfigError::DuplicateDate(*date));
            }
        }
        Ok(Self { dates })
    }

    /// Load a YAML dates file.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::DatesFileIo {
            path: display.clone(),
            source,
        })?;
        let range = Self::from_yaml_str(&raw).map_err(|e| match e {
            ConfigError::DatesFileParse { source, .. } => ConfigError::DatesFileParse {
                path: display,
                source,
            },
            other => other,
        })?;
        debug!(count = range.len(), "Loaded dates file");
        Ok(range)
    }

    fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: DatesFile =
            serde_yaml::from_str(raw).map_err(|source| ConfigError::DatesFileParse {
                path: String::new(),
                source,
            })?;
        Self::from_dates(file.dates)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_inclusive_includes_both_ends() {
        let range = DateRange::inclusive(day("2023-06-30"), day("2023-07-02")).unwrap();
        assert_eq!(
            range.dates(),
            &[day("2023-06-30"), day("2023-07-01"), day("2023-07-02")]
        );
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::inclusive(day("2023-06-14"), day("2023-06-14")).unwrap();
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn test_default_festa_period_is_38_days() {
        let range = DateRange::inclusive(day(DEFAULT_START), day(DEFAULT_END)).unwrap();
        assert_eq!(range.len(), 38);
        assert_eq!(range.dates()[0], day("2023-06-14"));
        assert_eq!(range.dates()[37], day("2023-07-21"));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = DateRange::inclusive(day("2023-07-02"), day("2023-07-01")).unwrap_err();
        assert!(matches!(err, ConfigError::InvertedDateRange { .. }));
    }

    #[test]
    fn test_empty_list_rejected() {
        let err = DateRange::from_dates(vec![]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyDateRange));
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = DateRange::from_dates(vec![day("2023-06-14"), day("2023-06-14")]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateDate(d) if d == day("2023-06-14")));
    }

    #[test]
    fn test_explicit_order_preserved() {
        let range = DateRange::from_dates(vec![day("2023-07-01"), day("2023-06-14")]).unwrap();
        let collected: Vec<_> = range.iter().collect();
        assert_eq!(collected, vec![day("2023-07-01"), day("2023-06-14")]);
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = "dates:\n  - 2023-06-14\n  - 2023-06-16\n";
        let range = DateRange::from_yaml_str(yaml).unwrap();
        assert_eq!(range.dates(), &[day("2023-06-14"), day("2023-06-16")]);
    }

    #[test]
    fn test_from_yaml_str_bad_date() {
        let yaml = "dates:\n  - not-a-date\n";
        let err = DateRange::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::DatesFileParse { .. }));
    }

    #[test]
    fn test_from_yaml_file_missing() {
        let err = DateRange::from_yaml_file("/nonexistent/festa_dates.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::DatesFileIo { .. }));
    }
}
