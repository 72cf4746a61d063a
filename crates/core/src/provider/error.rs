//! Provider error types.

use thiserror::Error;

/// Errors surfaced by external providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider is unreachable or returned a server-side failure.
    ///
    /// Retryable: the job system backs off and retries.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider rejected the account as invalid. Not retried.
    #[error("Invalid account: {account_number} at bank {bank_code}")]
    InvalidAccount {
        /// The rejected account number.
        account_number: String,
        /// The bank code it was checked against.
        bank_code: String,
    },

    /// The provider response could not be interpreted.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Returns true when the caller should retry with backoff.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(ProviderError::Unavailable("503".into()).is_retryable());
        assert!(
            !ProviderError::InvalidAccount {
                account_number: "1".into(),
                bank_code: "2".into(),
            }
            .is_retryable()
        );
        assert!(!ProviderError::InvalidResponse("bad json".into()).is_retryable());
    }
}
