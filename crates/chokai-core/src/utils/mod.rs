//! Utility functions for collation and display formatting.

pub mod collation;
pub mod format;

pub use collation::NameCollator;
pub use format::{format_date, format_fiscal_period, format_fiscal_year};
