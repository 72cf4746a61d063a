//! Fire-and-forget notification collaborator.
//!
//! Notifications are emitted after state transitions; delivery failure is
//! never fatal to the transition that produced the event. Implementations
//! log and swallow their own errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use velora_shared::types::{
    ApprovalRequestId, BudgetId, OrganizationId, WalletEntryId,
};

use crate::approval::RequestStatus;
use crate::ledger::EntryStatus;

/// A state transition worth telling someone about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A budget was funded and activated; beneficiaries should hear.
    BudgetFunded {
        /// The organization.
        organization_id: OrganizationId,
        /// The activated budget.
        budget_id: BudgetId,
        /// Funding amount in minor units.
        amount: i64,
    },
    /// A budget was closed and its remainder returned.
    BudgetClosed {
        /// The organization.
        organization_id: OrganizationId,
        /// The closed budget.
        budget_id: BudgetId,
        /// Remainder returned in minor units.
        remainder: i64,
    },
    /// A budget balance dropped to or below its threshold.
    BudgetThresholdReached {
        /// The organization.
        organization_id: OrganizationId,
        /// The budget.
        budget_id: BudgetId,
        /// Balance after the spend, in minor units.
        balance: i64,
    },
    /// A transfer entry reached a terminal state.
    TransferSettled {
        /// The organization.
        organization_id: OrganizationId,
        /// The settled entry.
        entry_id: WalletEntryId,
        /// The terminal status.
        status: EntryStatus,
    },
    /// An approval request was created and awaits reviewers.
    ApprovalRequested {
        /// The organization.
        organization_id: OrganizationId,
        /// The new request.
        request_id: ApprovalRequestId,
    },
    /// An approval request resolved.
    ApprovalResolved {
        /// The organization.
        organization_id: OrganizationId,
        /// The resolved request.
        request_id: ApprovalRequestId,
        /// Approved or Declined.
        status: RequestStatus,
    },
}

/// Fire-and-forget notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one event. Must not fail the caller: implementations handle
    /// and log their own delivery errors.
    async fn notify(&self, event: NotificationEvent);
}

/// A notifier that drops every event. Used in tests and as a safe default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _event: NotificationEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serde_tagging() {
        let event = NotificationEvent::BudgetFunded {
            organization_id: OrganizationId::new(),
            budget_id: BudgetId::new(),
            amount: 200_000,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "budget_funded");
    }
}
