//! Ledger domain types.
//!
//! A `WalletEntry` is an append-mostly record of one balance-affecting
//! event. Entries are created `Pending` alongside the reservation that
//! backs them and leave `Pending` exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use velora_shared::types::{
    BudgetId, Currency, Money, OrganizationId, PayrollPayoutId, ProjectId, UserId, WalletEntryId,
    WalletId,
};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Money leaving the wallet or budget.
    Debit,
    /// Money entering the wallet or budget.
    Credit,
}

impl EntryType {
    /// Returns the string representation of the entry type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    /// Parses an entry type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debit" => Some(Self::Debit),
            "credit" => Some(Self::Credit),
            _ => None,
        }
    }
}

/// Settlement status of a ledger entry.
///
/// The valid transitions are:
/// - Pending → Successful (provider confirmed)
/// - Pending → Failed (provider rejected, funds credited back)
///
/// A reversal of a Successful entry never mutates the status; it stamps a
/// reversal marker and records a new compensating Credit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Funds reserved, awaiting provider confirmation.
    Pending,
    /// Settlement confirmed.
    Successful,
    /// Settlement failed, reservation credited back.
    Failed,
}

impl EntryStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Successful => "successful",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "successful" => Some(Self::Successful),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns true if the entry can no longer change status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Successful | Self::Failed)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Business purpose of a ledger entry.
///
/// The scope selects the confirm/compensate side effects applied when the
/// entry settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryScope {
    /// Outbound transfer from a wallet to an external counterparty.
    WalletTransfer,
    /// Outbound transfer spending from a budget.
    BudgetTransfer,
    /// Internal movement funding a budget from its wallet.
    BudgetFunding,
    /// Remainder returned to the wallet or project when a budget closes.
    BudgetClosure,
    /// Additional funds extending an active budget.
    BudgetExtension,
    /// Salary payout driven by the payroll scheduler.
    PayrollPayout,
}

impl EntryScope {
    /// Returns the string representation of the scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WalletTransfer => "wallet_transfer",
            Self::BudgetTransfer => "budget_transfer",
            Self::BudgetFunding => "budget_funding",
            Self::BudgetClosure => "budget_closure",
            Self::BudgetExtension => "budget_extension",
            Self::PayrollPayout => "payroll_payout",
        }
    }

    /// Parses a scope from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "wallet_transfer" => Some(Self::WalletTransfer),
            "budget_transfer" => Some(Self::BudgetTransfer),
            "budget_funding" => Some(Self::BudgetFunding),
            "budget_closure" => Some(Self::BudgetClosure),
            "budget_extension" => Some(Self::BudgetExtension),
            "payroll_payout" => Some(Self::PayrollPayout),
            _ => None,
        }
    }
}

/// An organization-scoped currency account.
///
/// Invariant: `balance >= 0` at all times; mutations happen only through
/// atomic conditional updates paired with a ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet ID.
    pub id: WalletId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Spendable balance in minor units.
    pub balance: i64,
    /// Balance net of unsettled reservations, in minor units.
    pub ledger_balance: i64,
    /// Wallet currency.
    pub currency: Currency,
    /// Whether this is the organization's primary wallet.
    pub primary: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Spendable balance as a typed amount.
    #[must_use]
    pub const fn spendable(&self) -> Money {
        Money::new(self.balance, self.currency)
    }

    /// Ledger balance as a typed amount.
    #[must_use]
    pub const fn ledger(&self) -> Money {
        Money::new(self.ledger_balance, self.currency)
    }
}

/// One balance-affecting ledger record.
///
/// Invariant: `balance_after = balance_before ± (amount + fee)` for the
/// owning wallet or budget; the entry leaves `Pending` exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletEntry {
    /// Entry ID.
    pub id: WalletEntryId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Wallet this entry moves money for.
    pub wallet_id: WalletId,
    /// Budget, when the entry is budget-scoped.
    pub budget_id: Option<BudgetId>,
    /// Project, when the entry is project-scoped.
    pub project_id: Option<ProjectId>,
    /// Payroll payout, for payroll-scoped entries.
    pub payroll_payout_id: Option<PayrollPayoutId>,
    /// Debit or credit.
    pub entry_type: EntryType,
    /// Settlement status.
    pub status: EntryStatus,
    /// Business purpose.
    pub scope: EntryScope,
    /// Amount in minor units (always positive).
    pub amount: i64,
    /// Fee in minor units (zero or positive).
    pub fee: i64,
    /// Currency of the amounts.
    pub currency: Currency,
    /// Wallet balance before this entry.
    pub balance_before: i64,
    /// Wallet balance after this entry.
    pub balance_after: i64,
    /// Ledger balance before this entry.
    pub ledger_balance_before: i64,
    /// Ledger balance after this entry.
    pub ledger_balance_after: i64,
    /// Caller-chosen idempotency key.
    pub reference: String,
    /// Provider-assigned transfer ID, once known.
    pub provider_ref: Option<String>,
    /// Free-text narration shown on statements.
    pub narration: Option<String>,
    /// Scope-specific payload (e.g. counterparty snapshot).
    pub meta: serde_json::Value,
    /// Entry this one compensates, for reversal credits.
    pub reverses: Option<WalletEntryId>,
    /// Stamped when a reversal of this entry has been processed.
    pub reversed_at: Option<DateTime<Utc>>,
    /// When the entry left Pending.
    pub settled_at: Option<DateTime<Utc>>,
    /// Raw provider response captured at settlement.
    pub gateway_response: Option<String>,
    /// User who initiated the movement, when applicable.
    pub created_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl WalletEntry {
    /// Total balance impact of this entry (amount + fee).
    ///
    /// Saturates on overflow; inputs are validated at creation time.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.amount.saturating_add(self.fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_round_trip() {
        assert_eq!(EntryType::parse("debit"), Some(EntryType::Debit));
        assert_eq!(EntryType::parse("CREDIT"), Some(EntryType::Credit));
        assert_eq!(EntryType::Debit.as_str(), "debit");
        assert_eq!(EntryType::parse("transfer"), None);
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(EntryStatus::parse("pending"), Some(EntryStatus::Pending));
        assert_eq!(
            EntryStatus::parse("Successful"),
            Some(EntryStatus::Successful)
        );
        assert_eq!(EntryStatus::parse("failed"), Some(EntryStatus::Failed));
        assert_eq!(EntryStatus::parse("reversed"), None);
    }

    #[test]
    fn test_status_terminality() {
        assert!(!EntryStatus::Pending.is_terminal());
        assert!(EntryStatus::Successful.is_terminal());
        assert!(EntryStatus::Failed.is_terminal());
    }

    #[test]
    fn test_wallet_typed_balances() {
        let wallet = Wallet {
            id: WalletId::new(),
            organization_id: OrganizationId::new(),
            balance: 47_500,
            ledger_balance: 47_500,
            currency: Currency::Ngn,
            primary: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(wallet.spendable(), Money::new(47_500, Currency::Ngn));
        assert_eq!(wallet.ledger(), Money::new(47_500, Currency::Ngn));
    }

    #[test]
    fn test_scope_round_trip() {
        for scope in [
            EntryScope::WalletTransfer,
            EntryScope::BudgetTransfer,
            EntryScope::BudgetFunding,
            EntryScope::BudgetClosure,
            EntryScope::BudgetExtension,
            EntryScope::PayrollPayout,
        ] {
            assert_eq!(EntryScope::parse(scope.as_str()), Some(scope));
        }
        assert_eq!(EntryScope::parse("card_spend"), None);
    }
}
