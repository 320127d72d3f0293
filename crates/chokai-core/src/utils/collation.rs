//! Locale-aware name comparison for rosters.

use std::cmp::Ordering;

use icu::collator::{Collator, CollatorOptions};
use icu::locid::locale;
use tracing::warn;

/// Compares names under Japanese collation rules.
///
/// Falls back to code-point order if the collation data cannot be loaded.
pub struct NameCollator {
    collator: Option<Collator>,
}

impl NameCollator {
    pub fn japanese() -> Self {
        match Collator::try_new(&locale!("ja").into(), CollatorOptions::new()) {
            Ok(collator) => Self {
                collator: Some(collator),
            },
            Err(e) => {
                warn!(error = ?e, "Japanese collator unavailable, using code-point order");
                Self { collator: None }
            }
        }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.cmp(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gojuon_order_for_hiragana() {
        let collator = NameCollator::japanese();
        assert_eq!(collator.compare("あおき", "いとう"), Ordering::Less);
        assert_eq!(collator.compare("さとう", "かとう"), Ordering::Greater);
    }

    #[test]
    fn test_katakana_sorts_with_hiragana_reading() {
        // Code-point order puts every katakana string after every hiragana one;
        // collation interleaves them by reading.
        let collator = NameCollator::japanese();
        assert_eq!(collator.compare("アオキ", "いとう"), Ordering::Less);
    }

    #[test]
    fn test_identical_names_are_equal() {
        let collator = NameCollator::japanese();
        assert_eq!(collator.compare("たなか", "たなか"), Ordering::Equal);
    }
}
