//! Grade bands derived from a child's birthdate and a target fiscal year.
//!
//! Cohorts follow the fixed Japanese school-year cutoff: children born from
//! April 2 of one year through April 1 of the next share a school year, so a
//! child born on April 1 is placed with the older cohort. The cutoff does not
//! follow the organization's configured fiscal-year start month.
//!
//! Bands are never stored; they are recomputed on every read. Children with
//! no birthdate, or born after the target year's cutoff, map to
//! [`GradeBand::Unknown`], which sorts after every known band.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::fiscal::FiscalYear;

/// Month the school year starts in.
pub const SCHOOL_YEAR_START_MONTH: u32 = 4;

/// First birthday (day of `SCHOOL_YEAR_START_MONTH`) belonging to the younger cohort.
pub const SCHOOL_YEAR_CUTOFF_DAY: u32 = 2;

/// School age of the first elementary grade.
const FIRST_GRADE_SCHOOL_AGE: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GradeBand {
    /// Not yet in kindergarten (school age 0-2).
    PreKindergarten,
    Nensho,
    Nenchu,
    Nencho,
    Grade1,
    Grade2,
    Grade3,
    Grade4,
    Grade5,
    Grade6,
    Graduated,
    Unknown,
}

impl GradeBand {
    pub const ALL: [GradeBand; 12] = [
        GradeBand::PreKindergarten,
        GradeBand::Nensho,
        GradeBand::Nenchu,
        GradeBand::Nencho,
        GradeBand::Grade1,
        GradeBand::Grade2,
        GradeBand::Grade3,
        GradeBand::Grade4,
        GradeBand::Grade5,
        GradeBand::Grade6,
        GradeBand::Graduated,
        GradeBand::Unknown,
    ];

    /// Band for a school age (years completed at the start of the school year).
    pub fn from_school_age(school_age: i64) -> Self {
        match school_age {
            i64::MIN..=-1 => GradeBand::Unknown,
            0..=2 => GradeBand::PreKindergarten,
            3 => GradeBand::Nensho,
            4 => GradeBand::Nenchu,
            5 => GradeBand::Nencho,
            6 => GradeBand::Grade1,
            7 => GradeBand::Grade2,
            8 => GradeBand::Grade3,
            9 => GradeBand::Grade4,
            10 => GradeBand::Grade5,
            11 => GradeBand::Grade6,
            _ => GradeBand::Graduated,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GradeBand::PreKindergarten => "未就園",
            GradeBand::Nensho => "年少",
            GradeBand::Nenchu => "年中",
            GradeBand::Nencho => "年長",
            GradeBand::Grade1 => "1年生",
            GradeBand::Grade2 => "2年生",
            GradeBand::Grade3 => "3年生",
            GradeBand::Grade4 => "4年生",
            GradeBand::Grade5 => "5年生",
            GradeBand::Grade6 => "6年生",
            GradeBand::Graduated => "卒業",
            GradeBand::Unknown => "不明",
        }
    }

    /// Sort position: youngest first, graduated after grade 6, unknown last.
    pub fn order(&self) -> u8 {
        *self as u8
    }

    /// Elementary grade number (1-6), if the band is one.
    pub fn elementary_grade(&self) -> Option<u8> {
        let order = self.order();
        let first = GradeBand::Grade1.order();
        let last = GradeBand::Grade6.order();
        (first..=last).contains(&order).then(|| order - first + 1)
    }
}

/// A resolved band with its display label and sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grade {
    pub band: GradeBand,
    pub label: &'static str,
    pub order: u8,
}

impl From<GradeBand> for Grade {
    fn from(band: GradeBand) -> Self {
        Self {
            band,
            label: band.label(),
            order: band.order(),
        }
    }
}

/// Years completed at the start of the target school year.
///
/// Negative when the child is born after that school year's cohort cutoff.
/// Computed in `i64` so any fiscal year, including an unvalidated override,
/// yields a value.
pub fn school_age(birthdate: NaiveDate, fiscal_year: FiscalYear) -> i64 {
    let joins_younger_cohort =
        (birthdate.month(), birthdate.day()) >= (SCHOOL_YEAR_START_MONTH, SCHOOL_YEAR_CUTOFF_DAY);
    let birth_year = i64::from(birthdate.year());
    let cohort_year = if joins_younger_cohort {
        birth_year
    } else {
        birth_year - 1
    };
    i64::from(fiscal_year.year()) - cohort_year - 1
}

pub fn resolve_grade(birthdate: Option<NaiveDate>, fiscal_year: FiscalYear) -> Grade {
    let band = match birthdate {
        Some(date) => GradeBand::from_school_age(school_age(date, fiscal_year)),
        None => GradeBand::Unknown,
    };
    band.into()
}

/// Birthdate range (inclusive) of children entering first grade in `fiscal_year`.
pub fn first_grade_birth_range(fiscal_year: FiscalYear) -> Option<(NaiveDate, NaiveDate)> {
    let cohort_year = fiscal_year.year().checked_sub(FIRST_GRADE_SCHOOL_AGE + 1)?;
    let start = NaiveDate::from_ymd_opt(cohort_year, SCHOOL_YEAR_START_MONTH, SCHOOL_YEAR_CUTOFF_DAY)?;
    let end = NaiveDate::from_ymd_opt(cohort_year + 1, SCHOOL_YEAR_START_MONTH, SCHOOL_YEAR_CUTOFF_DAY)?
        .pred_opt()?;
    Some((start, end))
}
