//! Budget domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use velora_shared::types::{BudgetId, Currency, OrganizationId, ProjectId, UserId, WalletId};

/// Budget lifecycle status.
///
/// The valid transitions are:
/// - Pending → Active (funding settles)
/// - Active → Paused (pause)
/// - Paused → Active (unpause)
/// - Pending | Active | Paused → Closed (terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// Created by a requester, awaiting funding/approval.
    Pending,
    /// Funded and spendable.
    Active,
    /// Temporarily frozen; no spending allowed.
    Paused,
    /// Terminally closed; remainder returned to the wallet or project.
    Closed,
}

impl BudgetStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Closed => "closed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Returns true if the budget can no longer change status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user allowed to spend from a budget, with an optional per-user cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    /// The beneficiary user.
    pub user_id: UserId,
    /// Per-user spend ceiling in minor units, when set.
    pub allocation: Option<i64>,
}

/// An allocation carved from a wallet.
///
/// Invariant: `balance <= amount`, and a beneficiary's spend never exceeds
/// their `allocation` when one is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    /// Budget ID.
    pub id: BudgetId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Wallet the budget is carved from.
    pub wallet_id: WalletId,
    /// Parent project, when the budget belongs to one.
    pub project_id: Option<ProjectId>,
    /// Budget name.
    pub name: String,
    /// Approved ceiling in minor units.
    pub amount: i64,
    /// Spendable remainder in minor units.
    pub balance: i64,
    /// Total spent so far in minor units.
    pub amount_used: i64,
    /// Lifecycle status.
    pub status: BudgetStatus,
    /// Low-balance notification threshold in minor units, when set.
    pub threshold: Option<i64>,
    /// Users allowed to spend from the budget.
    pub beneficiaries: Vec<Beneficiary>,
    /// Budget currency (matches the wallet).
    pub currency: Currency,
    /// User who requested the budget.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Finds a beneficiary record for a user.
    #[must_use]
    pub fn beneficiary(&self, user_id: UserId) -> Option<&Beneficiary> {
        self.beneficiaries.iter().find(|b| b.user_id == user_id)
    }
}
