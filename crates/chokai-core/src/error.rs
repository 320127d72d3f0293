use thiserror::Error;

use crate::fiscal::FiscalYear;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Duplicate {collection} records for key {key} ({count} rows) - reconcile and retry")]
    DuplicateKeyConflict {
        collection: &'static str,
        key: String,
        count: usize,
    },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Fiscal year {0} is outside the supported calendar range")]
    FiscalYearOutOfRange(FiscalYear),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Whether the caller can re-resolve and retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::DuplicateKeyConflict { .. }
                | EngineError::Store(StoreError::UniqueViolation { .. })
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_conflict_is_retryable() {
        let err = EngineError::DuplicateKeyConflict {
            collection: "event_participations",
            key: "(EventId(1), MemberId(2), None)".to_string(),
            count: 2,
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("2 rows"));
    }

    #[test]
    fn test_permission_denied_is_not_retryable() {
        let err = EngineError::PermissionDenied("member 3 may not seed roles".to_string());
        assert!(!err.is_retryable());
    }
}
