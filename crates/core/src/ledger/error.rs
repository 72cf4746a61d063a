//! Ledger error types.

use thiserror::Error;
use uuid::Uuid;

use super::types::EntryStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Transfer amount cannot be zero.
    #[error("Amount cannot be zero")]
    ZeroAmount,

    /// Transfer amount cannot be negative.
    #[error("Amount cannot be negative")]
    NegativeAmount,

    /// Fee cannot be negative.
    #[error("Fee cannot be negative")]
    NegativeFee,

    /// Amount plus fee overflows the minor-unit range.
    #[error("Amount plus fee overflows")]
    AmountOverflow,

    /// Entry currency does not match the wallet currency.
    #[error("Currency mismatch: wallet is {wallet}, request is {requested}")]
    CurrencyMismatch {
        /// Wallet currency code.
        wallet: String,
        /// Requested currency code.
        requested: String,
    },

    // ========== Balance Errors ==========
    /// Balance cannot cover the requested amount plus fee.
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Spendable balance at the time of the attempt.
        available: i64,
        /// Amount plus fee requested.
        requested: i64,
    },

    /// A same-user, same-amount submission landed inside the rolling window.
    #[error("Duplicate transfer attempt detected")]
    DuplicateTransferAttempt,

    // ========== Lookup Errors ==========
    /// Wallet not found.
    #[error("Wallet not found: {0}")]
    WalletNotFound(Uuid),

    /// Ledger entry not found.
    #[error("Ledger entry not found for reference {0}")]
    EntryNotFound(String),

    // ========== State Errors ==========
    /// Entry already left Pending; settlement is a no-op.
    #[error("Entry already settled with status {status}")]
    AlreadySettled {
        /// The terminal status the entry holds.
        status: EntryStatus,
    },

    /// Attempted an invalid status transition.
    #[error("Invalid entry transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: EntryStatus,
        /// Attempted target status.
        to: EntryStatus,
    },

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::NegativeFee => "NEGATIVE_FEE",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::DuplicateTransferAttempt => "DUPLICATE_TRANSFER_ATTEMPT",
            Self::WalletNotFound(_) => "WALLET_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::AlreadySettled { .. } => "ALREADY_SETTLED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ZeroAmount
            | Self::NegativeAmount
            | Self::NegativeFee
            | Self::AmountOverflow
            | Self::CurrencyMismatch { .. } => 400,

            Self::InsufficientFunds { .. } | Self::AlreadySettled { .. } => 422,

            Self::DuplicateTransferAttempt | Self::InvalidTransition { .. } => 409,

            Self::WalletNotFound(_) | Self::EntryNotFound(_) => 404,

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
            LedgerError::InsufficientFunds {
                available: 100,
                requested: 200,
            }
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(
            LedgerError::DuplicateTransferAttempt.error_code(),
            "DUPLICATE_TRANSFER_ATTEMPT"
        );
        assert_eq!(LedgerError::ZeroAmount.error_code(), "ZERO_AMOUNT");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            LedgerError::InsufficientFunds {
                available: 0,
                requested: 1,
            }
            .status_code(),
            422
        );
        assert_eq!(LedgerError::DuplicateTransferAttempt.status_code(), 409);
        assert_eq!(LedgerError::WalletNotFound(Uuid::nil()).status_code(), 404);
        assert_eq!(LedgerError::Database("x".into()).status_code(), 500);
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientFunds {
            available: 47_500,
            requested: 52_500,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: available 47500, requested 52500"
        );
    }
}
