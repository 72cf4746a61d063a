//! Transfer provider contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use velora_shared::types::Currency;

use crate::counterparty::CounterpartySnapshot;

use super::error::ProviderError;

/// Normalized status of a provider-side transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// The transfer settled immediately.
    Successful,
    /// The transfer is in flight; a webhook or requery will settle it.
    Pending,
    /// The transfer failed immediately.
    Failed,
}

impl TransferStatus {
    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "successful" => Some(Self::Successful),
            "pending" => Some(Self::Pending),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

/// A transfer initiation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Caller-chosen idempotency key, echoed back in webhooks.
    pub reference: String,
    /// Amount in minor units.
    pub amount: i64,
    /// Transfer currency.
    pub currency: Currency,
    /// Resolved destination account.
    pub counterparty: CounterpartySnapshot,
    /// Statement narration.
    pub narration: Option<String>,
}

/// A normalized provider outcome for a transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Normalized status.
    pub status: TransferStatus,
    /// Provider-assigned transfer ID, when issued.
    pub provider_ref: Option<String>,
    /// Raw provider response for the audit trail.
    pub gateway_response: Option<String>,
}

/// The contract every transfer provider implements.
#[async_trait]
pub trait TransferProvider: Send + Sync {
    /// Initiates an outbound transfer.
    async fn initiate_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferOutcome, ProviderError>;

    /// Re-queries a transfer by its provider-assigned ID.
    async fn verify_transfer(&self, provider_ref: &str) -> Result<TransferOutcome, ProviderError>;
}

/// The closed set of supported transfer providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferProviderKind {
    /// Deterministic in-process provider for development and tests.
    Mock,
    /// REST provider speaking the normalized JSON contract.
    Rest,
}

impl std::str::FromStr for TransferProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "rest" => Ok(Self::Rest),
            _ => Err(format!("Unknown transfer provider: {s}")),
        }
    }
}
