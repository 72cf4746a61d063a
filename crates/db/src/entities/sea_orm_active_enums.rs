//! Database enum types backing `SeaORM` entities.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_type")]
pub enum EntryType {
    /// Money leaving the wallet or budget.
    #[sea_orm(string_value = "debit")]
    Debit,
    /// Money entering the wallet or budget.
    #[sea_orm(string_value = "credit")]
    Credit,
}

/// Settlement status of a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_status")]
pub enum EntryStatus {
    /// Funds reserved, awaiting confirmation.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settlement confirmed.
    #[sea_orm(string_value = "successful")]
    Successful,
    /// Settlement failed, reservation credited back.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Business purpose of a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_scope")]
pub enum EntryScope {
    /// Outbound wallet transfer.
    #[sea_orm(string_value = "wallet_transfer")]
    WalletTransfer,
    /// Outbound budget-scoped transfer.
    #[sea_orm(string_value = "budget_transfer")]
    BudgetTransfer,
    /// Budget funding movement.
    #[sea_orm(string_value = "budget_funding")]
    BudgetFunding,
    /// Budget closure remainder.
    #[sea_orm(string_value = "budget_closure")]
    BudgetClosure,
    /// Budget extension movement.
    #[sea_orm(string_value = "budget_extension")]
    BudgetExtension,
    /// Payroll payout.
    #[sea_orm(string_value = "payroll_payout")]
    PayrollPayout,
}

/// Budget lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "budget_status")]
pub enum BudgetStatus {
    /// Awaiting funding/approval.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Funded and spendable.
    #[sea_orm(string_value = "active")]
    Active,
    /// Temporarily frozen.
    #[sea_orm(string_value = "paused")]
    Paused,
    /// Terminally closed.
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// Workflow a rule or request governs.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "workflow_type")]
pub enum WorkflowType {
    /// Budget creation/funding requests.
    #[sea_orm(string_value = "expense")]
    Expense,
    /// Outbound transfers.
    #[sea_orm(string_value = "transaction")]
    Transaction,
    /// Budget ceiling extensions.
    #[sea_orm(string_value = "budget_extension")]
    BudgetExtension,
    /// Payroll run approvals.
    #[sea_orm(string_value = "payroll")]
    Payroll,
}

/// Reviewer quorum required by a rule.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "approval_type")]
pub enum ApprovalType {
    /// Every reviewer must approve.
    #[sea_orm(string_value = "everyone")]
    Everyone,
    /// The first approval resolves the request.
    #[sea_orm(string_value = "anyone")]
    Anyone,
}

/// Status of a single review.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "review_status")]
pub enum ReviewStatus {
    /// Awaiting the reviewer's decision.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Reviewer approved.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Reviewer declined.
    #[sea_orm(string_value = "declined")]
    Declined,
}

/// Overall status of an approval request.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "request_status")]
pub enum RequestStatus {
    /// Awaiting quorum.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Quorum met.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Terminally declined.
    #[sea_orm(string_value = "declined")]
    Declined,
}

/// What a transfer policy checks.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "policy_kind")]
pub enum PolicyKind {
    /// Blocks transfers on configured weekdays.
    #[sea_orm(string_value = "calendar")]
    Calendar,
    /// Blocks when a rolling-window spend sum would be exceeded.
    #[sea_orm(string_value = "spend_limit")]
    SpendLimit,
    /// Requires an attached invoice.
    #[sea_orm(string_value = "invoice")]
    Invoice,
}

/// Rolling window for spend-limit policies.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "policy_window")]
pub enum PolicyWindow {
    /// Last 1 day.
    #[sea_orm(string_value = "daily")]
    Daily,
    /// Last 7 days.
    #[sea_orm(string_value = "weekly")]
    Weekly,
    /// Last 30 days.
    #[sea_orm(string_value = "monthly")]
    Monthly,
}

/// Payroll payout batch status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payroll_status")]
pub enum PayrollStatus {
    /// Awaiting approval.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved for processing.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Payouts in flight.
    #[sea_orm(string_value = "processing")]
    Processing,
    /// All payouts settled.
    #[sea_orm(string_value = "paid")]
    Paid,
}
