//! Settlement event types.

use serde::{Deserialize, Serialize};
use std::fmt;

use velora_shared::types::Currency;

/// Terminal outcome reported by a provider.
///
/// Anything outside this set must abort processing without mutating state —
/// an unknown status never defaults to success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    /// Transfer settled successfully.
    Successful,
    /// Transfer failed; reserved funds must be credited back.
    Failed,
    /// Previously settled funds were clawed back by the network.
    Reversed,
}

impl SettlementStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::Reversed => "reversed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "successful" => Some(Self::Successful),
            "failed" => Some(Self::Failed),
            "reversed" => Some(Self::Reversed),
            _ => None,
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized settlement outcome delivered by a webhook or requery.
///
/// Delivery is at-least-once, unordered across references, and may arrive
/// arbitrarily late.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEvent {
    /// The ledger entry's idempotency key.
    pub reference: String,
    /// Reported terminal outcome.
    pub status: SettlementStatus,
    /// Reported amount in minor units.
    pub amount: i64,
    /// Reported currency.
    pub currency: Currency,
    /// Raw provider response for the audit trail.
    pub gateway_response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            SettlementStatus::Successful,
            SettlementStatus::Failed,
            SettlementStatus::Reversed,
        ] {
            assert_eq!(SettlementStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert_eq!(SettlementStatus::parse("settled"), None);
        assert_eq!(SettlementStatus::parse("pending"), None);
        assert_eq!(SettlementStatus::parse(""), None);
    }
}
