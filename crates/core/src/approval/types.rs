//! Approval workflow domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::counterparty::CounterpartySnapshot;
use velora_shared::types::{
    ApprovalRequestId, ApprovalRuleId, BudgetId, Currency, OrganizationId, PayrollPayoutId, UserId,
    WalletId,
};

/// The kind of money-moving action a rule or request governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    /// Budget creation/funding requests.
    Expense,
    /// Outbound wallet or budget transfers.
    Transaction,
    /// Raising an existing budget's ceiling.
    BudgetExtension,
    /// Payroll run approval.
    Payroll,
}

impl WorkflowType {
    /// Returns the string representation of the workflow type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Transaction => "transaction",
            Self::BudgetExtension => "budget_extension",
            Self::Payroll => "payroll",
        }
    }

    /// Parses a workflow type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "expense" => Some(Self::Expense),
            "transaction" => Some(Self::Transaction),
            "budget_extension" => Some(Self::BudgetExtension),
            "payroll" => Some(Self::Payroll),
            _ => None,
        }
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reviewer quorum required to approve a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalType {
    /// Every reviewer must approve.
    Everyone,
    /// The first approval resolves the request.
    Anyone,
}

impl ApprovalType {
    /// Returns the string representation of the approval type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Everyone => "everyone",
            Self::Anyone => "anyone",
        }
    }

    /// Parses an approval type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "everyone" => Some(Self::Everyone),
            "anyone" => Some(Self::Anyone),
            _ => None,
        }
    }
}

/// A per-organization approval policy.
///
/// A rule matches a request when the workflow types agree and the request
/// amount is at or below the rule's `amount` ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Rule ID.
    pub id: ApprovalRuleId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Workflow the rule governs.
    pub workflow_type: WorkflowType,
    /// Required quorum.
    pub approval_type: ApprovalType,
    /// Amount ceiling in minor units.
    pub amount: i64,
    /// The reviewers the rule assigns.
    pub reviewers: Vec<UserId>,
}

/// Status of a single review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Awaiting the reviewer's decision.
    Pending,
    /// Reviewer approved.
    Approved,
    /// Reviewer declined.
    Declined,
}

impl ReviewStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Declined => "declined",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }
}

/// One reviewer's decision slot on a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// The reviewer.
    pub reviewer: UserId,
    /// Decision status.
    pub status: ReviewStatus,
    /// Optional reason, required when declining.
    pub reason: Option<String>,
    /// When the decision was made.
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Overall status of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting quorum.
    Pending,
    /// Quorum met; the deferred action has been dispatched.
    Approved,
    /// Terminally declined.
    Declined,
}

impl RequestStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Declined => "declined",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }

    /// Returns true if the request can no longer change status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Declined)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The deferred-action payload snapshotted onto a request.
///
/// One variant per workflow type; the dispatcher matches exhaustively so an
/// unhandled workflow is a compile error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "workflow_type", rename_all = "snake_case")]
pub enum ApprovalProperties {
    /// Fund and activate a pending budget.
    Expense {
        /// Budget to activate.
        budget_id: BudgetId,
        /// Wallet the funding debits.
        wallet_id: WalletId,
        /// Funding amount in minor units.
        amount: i64,
    },
    /// Raise an active budget's ceiling.
    BudgetExtension {
        /// Budget to extend.
        budget_id: BudgetId,
        /// Wallet the extension debits.
        wallet_id: WalletId,
        /// Additional amount in minor units.
        additional_amount: i64,
    },
    /// Execute an outbound transfer.
    Transaction {
        /// Wallet the transfer debits.
        wallet_id: WalletId,
        /// Budget being spent, when budget-scoped.
        budget_id: Option<BudgetId>,
        /// Transfer amount in minor units.
        amount: i64,
        /// Transfer fee in minor units.
        fee: i64,
        /// Transfer currency.
        currency: Currency,
        /// Caller-chosen idempotency key.
        reference: String,
        /// Resolved counterparty snapshot.
        counterparty: CounterpartySnapshot,
        /// Statement narration.
        narration: Option<String>,
    },
    /// Mark a payroll run approved for processing.
    Payroll {
        /// The payroll payout batch.
        payroll_payout_id: PayrollPayoutId,
    },
}

impl ApprovalProperties {
    /// The workflow type this payload belongs to.
    #[must_use]
    pub const fn workflow_type(&self) -> WorkflowType {
        match self {
            Self::Expense { .. } => WorkflowType::Expense,
            Self::BudgetExtension { .. } => WorkflowType::BudgetExtension,
            Self::Transaction { .. } => WorkflowType::Transaction,
            Self::Payroll { .. } => WorkflowType::Payroll,
        }
    }
}

/// One pending or resolved approval decision instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Request ID.
    pub id: ApprovalRequestId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Workflow the request governs.
    pub workflow_type: WorkflowType,
    /// The user who initiated the action.
    pub requester: UserId,
    /// The matched rule.
    pub approval_rule_id: ApprovalRuleId,
    /// Required quorum, copied from the rule at creation time.
    pub approval_type: ApprovalType,
    /// Reviewer decision slots.
    pub reviews: Vec<Review>,
    /// Overall status.
    pub status: RequestStatus,
    /// Snapshot of everything needed to re-invoke the deferred action.
    pub properties: ApprovalProperties,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When the request resolved, if it has.
    pub resolved_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_type_round_trip() {
        for wt in [
            WorkflowType::Expense,
            WorkflowType::Transaction,
            WorkflowType::BudgetExtension,
            WorkflowType::Payroll,
        ] {
            assert_eq!(WorkflowType::parse(wt.as_str()), Some(wt));
        }
        assert_eq!(WorkflowType::parse("invoice"), None);
    }

    #[test]
    fn test_approval_type_round_trip() {
        assert_eq!(ApprovalType::parse("everyone"), Some(ApprovalType::Everyone));
        assert_eq!(ApprovalType::parse("ANYONE"), Some(ApprovalType::Anyone));
        assert_eq!(ApprovalType::parse("majority"), None);
    }

    #[test]
    fn test_request_status_terminality() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Declined.is_terminal());
    }

    #[test]
    fn test_properties_workflow_type() {
        let props = ApprovalProperties::Expense {
            budget_id: BudgetId::new(),
            wallet_id: WalletId::new(),
            amount: 200_000,
        };
        assert_eq!(props.workflow_type(), WorkflowType::Expense);
    }

    #[test]
    fn test_properties_serde_tagging() {
        let props = ApprovalProperties::Payroll {
            payroll_payout_id: PayrollPayoutId::new(),
        };
        let json = serde_json::to_value(&props).unwrap();
        assert_eq!(json["workflow_type"], "payroll");

        let back: ApprovalProperties = serde_json::from_value(json).unwrap();
        assert_eq!(back, props);
    }
}
