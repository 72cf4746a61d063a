//! Counterparty resolution error types.

use thiserror::Error;

/// Errors that can occur while resolving a counterparty.
#[derive(Debug, Error)]
pub enum CounterpartyError {
    /// The verification provider is unreachable or errored.
    #[error("Bank verification provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider reported the account as invalid. Not retried.
    #[error("Invalid account: {account_number} at bank {bank_code}")]
    InvalidAccount {
        /// The rejected account number.
        account_number: String,
        /// The bank code it was checked against.
        bank_code: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl CounterpartyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            Self::InvalidAccount { .. } => "INVALID_ACCOUNT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ProviderUnavailable(_) => 502,
            Self::InvalidAccount { .. } => 422,
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
            CounterpartyError::ProviderUnavailable("timeout".into()).error_code(),
            "PROVIDER_UNAVAILABLE"
        );
        assert_eq!(
            CounterpartyError::InvalidAccount {
                account_number: "0000000000".into(),
                bank_code: "058".into(),
            }
            .error_code(),
            "INVALID_ACCOUNT"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CounterpartyError::ProviderUnavailable("x".into()).status_code(),
            502
        );
        assert_eq!(
            CounterpartyError::InvalidAccount {
                account_number: "1".into(),
                bank_code: "2".into(),
            }
            .status_code(),
            422
        );
    }
}
