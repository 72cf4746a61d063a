//! Counterparty domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use velora_shared::types::{CounterpartyId, OrganizationId};

/// A verified account identity returned by a verification provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAccount {
    /// The account holder's name.
    pub account_name: String,
    /// The bank's display name, when the provider reports it.
    pub bank_name: Option<String>,
    /// The provider's bank identifier, when reported.
    pub bank_id: Option<String>,
}

/// A cached resolved bank-account identity.
///
/// Upserted on resolution, keyed by
/// `(organization, account_number, bank_code)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    /// Counterparty ID.
    pub id: CounterpartyId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// External account number.
    pub account_number: String,
    /// External bank code.
    pub bank_code: String,
    /// Verified account holder name.
    pub account_name: String,
    /// Bank display name, when known.
    pub bank_name: Option<String>,
    /// Provider bank identifier, when known.
    pub bank_id: Option<String>,
    /// Whether the counterparty is on the organization's saved-recipient list.
    pub is_recipient: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// The counterparty fields snapshotted onto ledger entries and deferred
/// transfer payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartySnapshot {
    /// External account number.
    pub account_number: String,
    /// External bank code.
    pub bank_code: String,
    /// Verified account holder name.
    pub account_name: String,
    /// Bank display name, when known.
    pub bank_name: Option<String>,
}

impl From<&Counterparty> for CounterpartySnapshot {
    fn from(cp: &Counterparty) -> Self {
        Self {
            account_number: cp.account_number.clone(),
            bank_code: cp.bank_code.clone(),
            account_name: cp.account_name.clone(),
            bank_name: cp.bank_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_counterparty() {
        let cp = Counterparty {
            id: CounterpartyId::new(),
            organization_id: OrganizationId::new(),
            account_number: "0123456789".to_string(),
            bank_code: "058".to_string(),
            account_name: "ADA OKAFOR".to_string(),
            bank_name: Some("Guaranty Trust Bank".to_string()),
            bank_id: Some("gtb-01".to_string()),
            is_recipient: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let snapshot = CounterpartySnapshot::from(&cp);
        assert_eq!(snapshot.account_number, "0123456789");
        assert_eq!(snapshot.bank_code, "058");
        assert_eq!(snapshot.account_name, "ADA OKAFOR");
        assert_eq!(snapshot.bank_name.as_deref(), Some("Guaranty Trust Bank"));
    }
}
