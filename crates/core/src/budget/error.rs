//! Budget error types.

use thiserror::Error;
use uuid::Uuid;

use super::types::BudgetStatus;

/// Errors that can occur during budget operations.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// Budget not found.
    #[error("Budget not found: {0}")]
    NotFound(Uuid),

    /// Attempted an invalid status transition.
    #[error("Invalid budget transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: BudgetStatus,
        /// Attempted target status.
        to: BudgetStatus,
    },

    /// Budget balance cannot cover the requested spend.
    #[error("Insufficient budget balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Spendable remainder at the time of the attempt.
        available: i64,
        /// Amount plus fee requested.
        requested: i64,
    },

    /// The spender is not a beneficiary of the budget.
    #[error("User {0} is not a beneficiary of this budget")]
    NotABeneficiary(Uuid),

    /// The spend would push a beneficiary past their allocation cap.
    #[error(
        "Allocation exceeded for user {user_id}: allocation {allocation}, \
         spent {spent}, requested {requested}"
    )]
    AllocationExceeded {
        /// The capped beneficiary.
        user_id: Uuid,
        /// Their allocation ceiling.
        allocation: i64,
        /// Amount already spent inside the budget.
        spent: i64,
        /// Amount requested now.
        requested: i64,
    },

    /// Spending requires an Active budget.
    #[error("Budget is {0}, spending requires an active budget")]
    NotActive(BudgetStatus),

    /// Extension amount must be positive.
    #[error("Extension amount must be positive")]
    InvalidExtensionAmount,

    /// Budget amount arithmetic overflowed.
    #[error("Budget amount overflows")]
    AmountOverflow,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl BudgetError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "BUDGET_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_BUDGET_TRANSITION",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BUDGET_BALANCE",
            Self::NotABeneficiary(_) => "NOT_A_BENEFICIARY",
            Self::AllocationExceeded { .. } => "ALLOCATION_EXCEEDED",
            Self::NotActive(_) => "BUDGET_NOT_ACTIVE",
            Self::InvalidExtensionAmount => "INVALID_EXTENSION_AMOUNT",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::NotABeneficiary(_) | Self::AllocationExceeded { .. } => 403,
            Self::InvalidTransition { .. } | Self::NotActive(_) => 409,
            Self::InsufficientBalance { .. } => 422,
            Self::InvalidExtensionAmount | Self::AmountOverflow => 400,
            Self::Database(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            BudgetError::NotFound(Uuid::nil()).error_code(),
            "BUDGET_NOT_FOUND"
        );
        assert_eq!(
            BudgetError::AllocationExceeded {
                user_id: Uuid::nil(),
                allocation: 100,
                spent: 80,
                requested: 30,
            }
            .error_code(),
            "ALLOCATION_EXCEEDED"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(BudgetError::NotFound(Uuid::nil()).status_code(), 404);
        assert_eq!(
            BudgetError::NotABeneficiary(Uuid::nil()).status_code(),
            403
        );
        assert_eq!(
            BudgetError::NotActive(BudgetStatus::Paused).status_code(),
            409
        );
        assert_eq!(
            BudgetError::InsufficientBalance {
                available: 0,
                requested: 1,
            }
            .status_code(),
            422
        );
    }
}
