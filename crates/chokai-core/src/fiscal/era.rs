//! Era-style ("Wareki") year labels such as `令和7年`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::FiscalYear;

/// Era name used when the organization has not configured one.
pub const DEFAULT_ERA_NAME: &str = "令和";

/// Gregorian year in which the default era's first year falls.
pub const DEFAULT_ERA_START_YEAR: i32 = 2019;

/// Idiom for the first year of an era.
const FIRST_YEAR_LABEL: &str = "元";

const YEAR_SUFFIX: char = '年';

/// Suffix some labels carry for fiscal years (`令和7年度`).
const FISCAL_YEAR_SUFFIX: &str = "年度";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EraLabelError {
    #[error("Label {label:?} is not in era {era}")]
    WrongEra { era: String, label: String },

    #[error("Label {0:?} has no year suffix")]
    MissingYearSuffix(String),

    #[error("Label {0:?} has no valid era ordinal")]
    InvalidOrdinal(String),
}

/// One-based position of `fiscal_year` within the era. Zero or negative for
/// years before the era starts.
pub fn era_ordinal(fiscal_year: FiscalYear, era_start_year: i32) -> i64 {
    i64::from(fiscal_year.year()) - i64::from(era_start_year) + 1
}

/// `{era}元年` for the first year, `{era}{n}年` after it.
///
/// Years before the era start produce a zero or negative ordinal
/// (`令和0年`, `令和-3年`). [`from_era_label`] rejects those, so the round
/// trip holds only from the era's first year onward.
pub fn to_era_label(fiscal_year: FiscalYear, era_name: &str, era_start_year: i32) -> String {
    match era_ordinal(fiscal_year, era_start_year) {
        1 => format!("{}{}{}", era_name, FIRST_YEAR_LABEL, YEAR_SUFFIX),
        ordinal => format!("{}{}{}", era_name, ordinal, YEAR_SUFFIX),
    }
}

/// Inverse of [`to_era_label`].
///
/// Accepts `元`, ASCII or full-width digits, whitespace between the era name
/// and the ordinal, and an optional `度` after `年`.
pub fn from_era_label(
    label: &str,
    era_name: &str,
    era_start_year: i32,
) -> Result<FiscalYear, EraLabelError> {
    let trimmed = label.trim();
    let rest = trimmed
        .strip_prefix(era_name)
        .ok_or_else(|| EraLabelError::WrongEra {
            era: era_name.to_string(),
            label: trimmed.to_string(),
        })?
        .trim_start();

    let ordinal_text = rest
        .strip_suffix(FISCAL_YEAR_SUFFIX)
        .or_else(|| rest.strip_suffix(YEAR_SUFFIX))
        .ok_or_else(|| EraLabelError::MissingYearSuffix(trimmed.to_string()))?
        .trim();

    let ordinal = if ordinal_text == FIRST_YEAR_LABEL {
        1
    } else {
        parse_ordinal(ordinal_text)
            .filter(|n| *n >= 1)
            .ok_or_else(|| EraLabelError::InvalidOrdinal(trimmed.to_string()))?
    };

    era_start_year
        .checked_add(ordinal - 1)
        .map(FiscalYear::new)
        .ok_or_else(|| EraLabelError::InvalidOrdinal(trimmed.to_string()))
}

/// Parse ASCII or full-width decimal digits.
fn parse_ordinal(text: &str) -> Option<i32> {
    if text.is_empty() {
        return None;
    }
    let mut value: i32 = 0;
    for c in text.chars() {
        let digit = match c {
            '0'..='9' => c as u32 - '0' as u32,
            '０'..='９' => c as u32 - '０' as u32,
            _ => return None,
        };
        value = value.checked_mul(10)?.checked_add(digit as i32)?;
    }
    Some(value)
}

/// An organization's era configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraCalendar {
    pub name: String,
    pub start_year: i32,
}

impl EraCalendar {
    pub fn new(name: &str, start_year: i32) -> Self {
        Self {
            name: name.to_string(),
            start_year,
        }
    }

    pub fn label(&self, fiscal_year: FiscalYear) -> String {
        to_era_label(fiscal_year, &self.name, self.start_year)
    }

    pub fn parse(&self, label: &str) -> Result<FiscalYear, EraLabelError> {
        from_era_label(label, &self.name, self.start_year)
    }
}

impl Default for EraCalendar {
    fn default() -> Self {
        Self::new(DEFAULT_ERA_NAME, DEFAULT_ERA_START_YEAR)
    }
}
