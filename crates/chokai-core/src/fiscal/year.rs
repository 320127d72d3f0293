use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Start month used when the organization has not configured one.
pub const DEFAULT_FISCAL_YEAR_START_MONTH: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FiscalYear(i32);

impl FiscalYear {
    pub const fn new(year: i32) -> Self {
        Self(year)
    }

    /// Calendar year in which this fiscal year starts.
    pub const fn year(self) -> i32 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn previous(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// First day of the fiscal year. `None` outside the supported date range.
    pub fn start_date(self, start_month: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, normalize_start_month(start_month), 1)
    }

    /// Last day of the fiscal year: the day before the next one starts.
    pub fn end_date(self, start_month: u32) -> Option<NaiveDate> {
        self.0
            .checked_add(1)
            .and_then(|next| FiscalYear(next).start_date(start_month))
            .and_then(|start| start.pred_opt())
    }

    /// Inclusive `(start, end)` dates of the fiscal year.
    pub fn period(self, start_month: u32) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start_date(start_month)?, self.end_date(start_month)?))
    }

    pub fn contains(self, date: NaiveDate, start_month: u32) -> bool {
        fiscal_year_of(date, start_month) == self
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FiscalYear {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(FiscalYear)
    }
}

/// Clamp a configured start month to 1..=12, falling back to April.
pub fn normalize_start_month(start_month: u32) -> u32 {
    if (1..=12).contains(&start_month) {
        start_month
    } else {
        warn!(start_month, "Invalid fiscal year start month, using April");
        DEFAULT_FISCAL_YEAR_START_MONTH
    }
}

/// The fiscal year a calendar date falls in.
pub fn fiscal_year_of(date: NaiveDate, start_month: u32) -> FiscalYear {
    if date.month() >= normalize_start_month(start_month) {
        FiscalYear(date.year())
    } else {
        FiscalYear(date.year() - 1)
    }
}

/// Working fiscal year for a request.
///
/// An explicit override (the session preference) wins unchanged, without
/// range validation; otherwise the year is derived from `today`.
pub fn resolve_fiscal_year(
    override_year: Option<FiscalYear>,
    today: NaiveDate,
    start_month: u32,
) -> FiscalYear {
    match override_year {
        Some(year) => {
            debug!(fiscal_year = %year, "Using fiscal year override");
            year
        }
        None => fiscal_year_of(today, start_month),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_resolve_before_start_month_is_previous_year() {
        assert_eq!(
            resolve_fiscal_year(None, date(2025, 2, 10), 4),
            FiscalYear::new(2024)
        );
    }

    #[test]
    fn test_resolve_on_start_month_is_current_year() {
        assert_eq!(
            resolve_fiscal_year(None, date(2025, 4, 1), 4),
            FiscalYear::new(2025)
        );
        assert_eq!(
            resolve_fiscal_year(None, date(2025, 3, 31), 4),
            FiscalYear::new(2024)
        );
    }

    #[test]
    fn test_resolve_every_start_month_and_day_of_year() {
        for start_month in 1..=12 {
            let mut day = date(2023, 1, 1);
            while day.year() == 2023 {
                let expected = if day.month() >= start_month { 2023 } else { 2022 };
                assert_eq!(
                    resolve_fiscal_year(None, day, start_month),
                    FiscalYear::new(expected),
                    "start month {} date {}",
                    start_month,
                    day
                );
                day = day.succ_opt().unwrap();
            }
        }
    }

    #[test]
    fn test_override_is_returned_unchanged() {
        let today = date(2025, 2, 10);
        assert_eq!(
            resolve_fiscal_year(Some(FiscalYear::new(2019)), today, 4),
            FiscalYear::new(2019)
        );
        // No range validation on overrides
        assert_eq!(
            resolve_fiscal_year(Some(FiscalYear::new(-5)), today, 4),
            FiscalYear::new(-5)
        );
    }

    #[test]
    fn test_invalid_start_month_falls_back_to_april() {
        assert_eq!(normalize_start_month(0), 4);
        assert_eq!(normalize_start_month(13), 4);
        assert_eq!(fiscal_year_of(date(2025, 3, 1), 99), FiscalYear::new(2024));
    }

    #[test]
    fn test_period_default_april() {
        let fy = FiscalYear::new(2025);
        assert_eq!(
            fy.period(4),
            Some((date(2025, 4, 1), date(2026, 3, 31)))
        );
    }

    #[test]
    fn test_period_january_start_is_calendar_year() {
        let fy = FiscalYear::new(2024);
        assert_eq!(
            fy.period(1),
            Some((date(2024, 1, 1), date(2024, 12, 31)))
        );
    }

    #[test]
    fn test_period_leap_february_end() {
        // March start: fiscal 2023 ends on 2024-02-29
        assert_eq!(FiscalYear::new(2023).end_date(3), Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_contains() {
        let fy = FiscalYear::new(2025);
        assert!(fy.contains(date(2026, 3, 31), 4));
        assert!(!fy.contains(date(2026, 4, 1), 4));
    }

    #[test]
    fn test_next_previous_and_parse() {
        let fy: FiscalYear = " 2025 ".parse().unwrap();
        assert_eq!(fy.next(), FiscalYear::new(2026));
        assert_eq!(fy.previous(), FiscalYear::new(2024));
        assert!("next year".parse::<FiscalYear>().is_err());
        assert_eq!(fy.to_string(), "2025");
    }

    #[test]
    fn test_out_of_range_year_has_no_period() {
        assert_eq!(FiscalYear::new(i32::MAX).period(4), None);
    }
}
