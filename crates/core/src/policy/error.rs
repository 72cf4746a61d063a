//! Policy error types.

use thiserror::Error;

/// The specific policy that blocked a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    /// Blocked by a calendar policy.
    #[error("Transfers are blocked on this weekday")]
    Calendar,

    /// Blocked by a spend-limit policy.
    #[error("Spend limit would be exceeded")]
    SpendLimit,

    /// Blocked because the transfer requires an attached invoice.
    #[error("An invoice is required for this transfer")]
    Invoice,

    /// Blocked because a beneficiary allocation cap would be exceeded.
    #[error("Beneficiary allocation would be exceeded")]
    Allocation,
}

impl PolicyViolation {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Calendar => "POLICY_VIOLATION_CALENDAR",
            Self::SpendLimit => "POLICY_VIOLATION_SPEND_LIMIT",
            Self::Invoice => "POLICY_VIOLATION_INVOICE",
            Self::Allocation => "POLICY_VIOLATION_ALLOCATION",
        }
    }
}

/// Errors that can occur during policy evaluation.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A policy blocked the transfer.
    #[error("Policy violation: {0}")]
    Violation(#[from] PolicyViolation),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PolicyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Violation(v) => v.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Violation(_) => 422,
            Self::Database(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_codes() {
        assert_eq!(
            PolicyViolation::Calendar.error_code(),
            "POLICY_VIOLATION_CALENDAR"
        );
        assert_eq!(
            PolicyViolation::SpendLimit.error_code(),
            "POLICY_VIOLATION_SPEND_LIMIT"
        );
        assert_eq!(
            PolicyViolation::Invoice.error_code(),
            "POLICY_VIOLATION_INVOICE"
        );
        assert_eq!(
            PolicyViolation::Allocation.error_code(),
            "POLICY_VIOLATION_ALLOCATION"
        );
    }

    #[test]
    fn test_policy_error_status() {
        assert_eq!(
            PolicyError::Violation(PolicyViolation::Invoice).status_code(),
            422
        );
        assert_eq!(PolicyError::Database("x".into()).status_code(), 500);
    }
}
