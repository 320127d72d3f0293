//! Fiscal-year arithmetic.
//!
//! A fiscal year is labelled by the calendar year in which it starts. With
//! the default start month of April, fiscal year 2025 runs from 2025-04-01
//! through 2026-03-31.

pub mod era;
pub mod year;

pub use era::{from_era_label, to_era_label, EraCalendar, EraLabelError, DEFAULT_ERA_NAME, DEFAULT_ERA_START_YEAR};
pub use year::{
    fiscal_year_of, normalize_start_month, resolve_fiscal_year, FiscalYear,
    DEFAULT_FISCAL_YEAR_START_MONTH,
};
