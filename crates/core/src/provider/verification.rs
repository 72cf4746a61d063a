//! Bank verification provider contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::counterparty::ResolvedAccount;

use super::error::ProviderError;

/// The contract every bank-verification provider implements.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Resolves an account number and bank code to a verified identity.
    async fn resolve_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<ResolvedAccount, ProviderError>;
}

/// The closed set of supported verification providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationProviderKind {
    /// Deterministic in-process provider for development and tests.
    Mock,
    /// REST provider speaking the normalized JSON contract.
    Rest,
}

impl std::str::FromStr for VerificationProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "rest" => Ok(Self::Rest),
            _ => Err(format!("Unknown verification provider: {s}")),
        }
    }
}
