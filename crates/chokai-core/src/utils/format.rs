use chrono::{Datelike, NaiveDate};

use crate::fiscal::{EraCalendar, FiscalYear};

/// Format a date the way notices print it: `2025年4月1日`.
pub fn format_date(date: NaiveDate) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}

/// `2025年4月1日〜2026年3月31日`, or the bare year when out of range.
pub fn format_fiscal_period(fiscal_year: FiscalYear, start_month: u32) -> String {
    match fiscal_year.period(start_month) {
        Some((start, end)) => format!("{}〜{}", format_date(start), format_date(end)),
        None => format!("{}年度", fiscal_year),
    }
}

/// Heading used on year-scoped screens: `2025年度（令和7年度）`.
pub fn format_fiscal_year(fiscal_year: FiscalYear, era: &EraCalendar) -> String {
    format!("{}年度（{}度）", fiscal_year, era.label(fiscal_year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        assert_eq!(format_date(date), "2025年4月1日");
    }

    #[test]
    fn test_format_fiscal_period() {
        assert_eq!(
            format_fiscal_period(FiscalYear::new(2025), 4),
            "2025年4月1日〜2026年3月31日"
        );
        assert_eq!(format_fiscal_period(FiscalYear::new(i32::MAX), 4), format!("{}年度", i32::MAX));
    }

    #[test]
    fn test_format_fiscal_year() {
        let era = EraCalendar::default();
        assert_eq!(format_fiscal_year(FiscalYear::new(2025), &era), "2025年度（令和7年度）");
        assert_eq!(format_fiscal_year(FiscalYear::new(2019), &era), "2019年度（令和元年度）");
    }
}
