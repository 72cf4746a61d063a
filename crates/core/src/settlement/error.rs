//! Settlement error types.

use thiserror::Error;

/// Errors that can occur while reconciling a settlement event.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// No entry carries the event's reference; abort without mutating.
    #[error("No ledger entry found for reference {0}")]
    EntryNotFound(String),

    /// The event carried a status outside the known terminal set.
    #[error("Unexpected settlement status: {0}")]
    UnexpectedStatus(String),

    /// The budget or wallet referenced by the entry vanished mid-flight.
    ///
    /// Fatal to the job attempt; the queue retries the event.
    #[error("Organization, wallet, or budget not found: {0}")]
    OwnerNotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl SettlementError {
    /// Returns the error code for API responses and job logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::UnexpectedStatus(_) => "UNEXPECTED_SETTLEMENT_STATUS",
            Self::OwnerNotFound(_) => "ORGANIZATION_OR_BUDGET_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true when the job system should retry the event.
    ///
    /// Lookup misses and unknown statuses are not retryable: replaying them
    /// cannot change the outcome and they are surfaced for operator
    /// reconciliation instead.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::OwnerNotFound(_) | Self::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SettlementError::EntryNotFound("tx-1".into()).error_code(),
            "ENTRY_NOT_FOUND"
        );
        assert_eq!(
            SettlementError::UnexpectedStatus("settled".into()).error_code(),
            "UNEXPECTED_SETTLEMENT_STATUS"
        );
        assert_eq!(
            SettlementError::OwnerNotFound("budget".into()).error_code(),
            "ORGANIZATION_OR_BUDGET_NOT_FOUND"
        );
    }

    #[test]
    fn test_retryability() {
        assert!(!SettlementError::EntryNotFound("tx-1".into()).is_retryable());
        assert!(!SettlementError::UnexpectedStatus("x".into()).is_retryable());
        assert!(SettlementError::OwnerNotFound("budget".into()).is_retryable());
        assert!(SettlementError::Database("conn".into()).is_retryable());
    }
}
