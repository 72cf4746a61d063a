//! Ledger engine: orchestrates policy checks, approvals, reservations,
//! provider calls, and settlement.
//!
//! The flow for a transfer: policy + balance checks run synchronously; if
//! an approval rule applies and quorum is unmet the request is persisted
//! and the flow suspends; otherwise funds are reserved atomically with a
//! Pending entry, the provider is invoked, and an immediate terminal result
//! settles synchronously. Anything still Pending is driven to a terminal
//! state later by webhook events or the requery worker.

use std::sync::Arc;

use chrono::{Datelike, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use velora_core::approval::{
    ApprovalError, ApprovalProperties, ApprovalRequest, ReviewDecision, WorkflowType,
};
use velora_core::budget::{BudgetError, BudgetService, BudgetStatus};
use velora_core::counterparty::{CounterpartyError, CounterpartySnapshot};
use velora_core::ledger::LedgerError;
use velora_core::notify::{NotificationEvent, Notifier};
use velora_core::policy::{PolicyError, PolicyViolation, TransferContext};
use velora_core::provider::{TransferProvider, TransferRequest, TransferStatus};
use velora_core::settlement::{SettlementError, SettlementEvent, SettlementStatus};
use velora_shared::config::ReconcilerConfig;
use velora_shared::types::{
    ApprovalRequestId, BudgetId, Currency, OrganizationId, UserId, WalletEntryId, WalletId,
};

use crate::entities::{
    payroll_payouts, wallet_entries,
    sea_orm_active_enums::{EntryScope, PayrollStatus},
};
use crate::repositories::settlement::to_core_entry_status;
use crate::repositories::{
    ApprovalRepository, BudgetRepository, CounterpartyResolver, PolicyRepository,
    RequestOrExecute, SettlementRepository, WalletRepository,
};

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Ledger failure (insufficient funds, duplicates, lookups).
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Budget rule failure.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// A transfer policy blocked the action.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Approval workflow failure.
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// Counterparty resolution failure.
    #[error(transparent)]
    Counterparty(#[from] CounterpartyError),

    /// Settlement reconciliation failure.
    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

/// Input for initiating a transfer.
#[derive(Debug, Clone)]
pub struct InitiateTransferInput {
    /// Owning organization.
    pub organization_id: Uuid,
    /// User initiating the transfer.
    pub user_id: Uuid,
    /// The user's department, for policy scoping.
    pub department: Option<String>,
    /// Wallet to debit.
    pub wallet_id: Uuid,
    /// Budget to spend from, when budget-scoped.
    pub budget_id: Option<Uuid>,
    /// Amount in minor units.
    pub amount: i64,
    /// Fee in minor units.
    pub fee: i64,
    /// Transfer currency.
    pub currency: Currency,
    /// Destination account number.
    pub account_number: String,
    /// Destination bank code.
    pub bank_code: String,
    /// Statement narration.
    pub narration: Option<String>,
    /// Caller-chosen idempotency key.
    pub reference: String,
    /// Whether an invoice document was attached.
    pub has_invoice: bool,
}

/// Result of initiating a transfer.
#[derive(Debug, Clone)]
pub enum TransferInitiation {
    /// The transfer executed; the entry holds the current settlement state.
    Executed(wallet_entries::Model),
    /// An approval request was created; the transfer runs on approval.
    PendingApproval(ApprovalRequest),
}

/// The ledger engine.
#[derive(Clone)]
pub struct LedgerEngine {
    db: DatabaseConnection,
    wallets: WalletRepository,
    budgets: BudgetRepository,
    policies: PolicyRepository,
    approvals: ApprovalRepository,
    settlements: SettlementRepository,
    counterparties: CounterpartyResolver,
    transfer_provider: Arc<dyn TransferProvider>,
    notifier: Arc<dyn Notifier>,
    config: ReconcilerConfig,
}

impl LedgerEngine {
    /// Wires the engine from its collaborators.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        transfer_provider: Arc<dyn TransferProvider>,
        counterparties: CounterpartyResolver,
        notifier: Arc<dyn Notifier>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            wallets: WalletRepository::new(db.clone()),
            budgets: BudgetRepository::new(db.clone()),
            policies: PolicyRepository::new(db.clone()),
            approvals: ApprovalRepository::new(db.clone()),
            settlements: SettlementRepository::new(db.clone()),
            counterparties,
            transfer_provider,
            notifier,
            config,
            db,
        }
    }

    /// Access to the wallet repository.
    #[must_use]
    pub const fn wallets(&self) -> &WalletRepository {
        &self.wallets
    }

    /// Access to the budget repository.
    #[must_use]
    pub const fn budgets(&self) -> &BudgetRepository {
        &self.budgets
    }

    /// Access to the approval repository.
    #[must_use]
    pub const fn approvals(&self) -> &ApprovalRepository {
        &self.approvals
    }

    /// Requests a transfer: policy and balance checks, then either a
    /// pending approval request or immediate execution.
    #[instrument(skip(self, input), fields(reference = %input.reference))]
    pub async fn initiate_transfer(
        &self,
        input: InitiateTransferInput,
    ) -> Result<TransferInitiation, EngineError> {
        // Policy gate runs before anything moves.
        let ctx = TransferContext {
            user_id: UserId::from_uuid(input.user_id),
            budget_id: input.budget_id.map(BudgetId::from_uuid),
            department: input.department.clone(),
            bank_code: input.bank_code.clone(),
            account_number: input.account_number.clone(),
            amount: input.amount,
            has_invoice: input.has_invoice,
            today: Utc::now().weekday(),
        };
        let decision = self
            .policies
            .check_transfer_policy(input.organization_id, &ctx)
            .await?;
        if let Some(violation) = first_violation(decision.calendar, decision.spend_limit, decision.invoice) {
            return Err(PolicyError::Violation(violation).into());
        }

        // Resolve the destination before reserving anything.
        let counterparty = self
            .counterparties
            .resolve(input.organization_id, &input.account_number, &input.bank_code)
            .await?;
        let snapshot = CounterpartySnapshot::from(&counterparty);

        // Budget-scoped transfers run the beneficiary and allocation rules.
        if let Some(budget_id) = input.budget_id {
            let budget = self.budgets.get(input.organization_id, budget_id).await?;
            let spent = self.budgets.spent_by_user(budget_id, input.user_id).await?;
            let total = velora_core::ledger::LedgerService::validate_total(
                input.amount,
                input.fee,
            )?;
            BudgetService::validate_spend(&budget, UserId::from_uuid(input.user_id), spent, total)?;
        }

        let properties = ApprovalProperties::Transaction {
            wallet_id: WalletId::from_uuid(input.wallet_id),
            budget_id: input.budget_id.map(BudgetId::from_uuid),
            amount: input.amount,
            fee: input.fee,
            currency: input.currency,
            reference: input.reference.clone(),
            counterparty: snapshot,
            narration: input.narration.clone(),
        };

        match self
            .approvals
            .request_or_execute(
                input.organization_id,
                input.user_id,
                WorkflowType::Transaction,
                input.amount,
                properties.clone(),
            )
            .await?
        {
            RequestOrExecute::Execute { .. } => {
                let entry = self
                    .execute_transaction(input.organization_id, Some(input.user_id), &properties)
                    .await?;
                Ok(TransferInitiation::Executed(entry))
            }
            RequestOrExecute::PendingApproval(request) => {
                self.notifier
                    .notify(NotificationEvent::ApprovalRequested {
                        organization_id: OrganizationId::from_uuid(input.organization_id),
                        request_id: request.id,
                    })
                    .await;
                Ok(TransferInitiation::PendingApproval(request))
            }
        }
    }

    /// Applies a review and dispatches or compensates on resolution.
    #[instrument(skip(self), fields(request_id = %request_id))]
    pub async fn review(
        &self,
        organization_id: Uuid,
        request_id: Uuid,
        reviewer: Uuid,
        decision: ReviewDecision,
        reason: Option<String>,
    ) -> Result<ApprovalRequest, EngineError> {
        let outcome = self
            .approvals
            .review(organization_id, request_id, reviewer, decision, reason)
            .await?;

        if let Some(properties) = outcome.dispatch {
            self.dispatch(organization_id, &outcome.request, &properties)
                .await?;
        } else if outcome.request.status == velora_core::approval::RequestStatus::Declined {
            self.compensate_declined(organization_id, &outcome.request)
                .await?;
        }

        if outcome.request.status.is_terminal() {
            self.notifier
                .notify(NotificationEvent::ApprovalResolved {
                    organization_id: OrganizationId::from_uuid(organization_id),
                    request_id: ApprovalRequestId::from_uuid(request_id),
                    status: outcome.request.status,
                })
                .await;
        }

        Ok(outcome.request)
    }

    /// Runs the workflow-specific executor for an approved payload.
    ///
    /// The same executors back the synchronous path; the match is
    /// exhaustive, so a new workflow type cannot ship without one.
    async fn dispatch(
        &self,
        organization_id: Uuid,
        request: &ApprovalRequest,
        properties: &ApprovalProperties,
    ) -> Result<(), EngineError> {
        match properties {
            ApprovalProperties::Transaction { .. } => {
                self.execute_transaction(
                    organization_id,
                    Some(request.requester.into_inner()),
                    properties,
                )
                .await?;
            }
            ApprovalProperties::Expense { budget_id, .. } => {
                self.fund_budget(
                    organization_id,
                    budget_id.into_inner(),
                    request.requester.into_inner(),
                )
                .await?;
            }
            ApprovalProperties::BudgetExtension {
                budget_id,
                additional_amount,
                ..
            } => {
                self.budgets
                    .extend(
                        organization_id,
                        budget_id.into_inner(),
                        *additional_amount,
                        request.requester.into_inner(),
                        &format!("bgt-ext-{}", Uuid::new_v4()),
                    )
                    .await?;
            }
            ApprovalProperties::Payroll { payroll_payout_id } => {
                self.approve_payroll(payroll_payout_id.into_inner()).await?;
            }
        }
        Ok(())
    }

    /// Compensating action for a declined request: a budget left Pending by
    /// an Expense request is closed.
    async fn compensate_declined(
        &self,
        organization_id: Uuid,
        request: &ApprovalRequest,
    ) -> Result<(), EngineError> {
        if let ApprovalProperties::Expense { budget_id, .. } = &request.properties {
            let budget = self
                .budgets
                .get(organization_id, budget_id.into_inner())
                .await?;
            if budget.status == BudgetStatus::Pending {
                self.budgets
                    .close(
                        organization_id,
                        budget_id.into_inner(),
                        request.requester.into_inner(),
                        &format!("bgt-close-{}", Uuid::new_v4()),
                    )
                    .await?;
                info!(budget_id = %budget_id, "pending budget closed after decline");
            }
        }
        Ok(())
    }

    /// Reserves funds, invokes the provider, and settles immediate results.
    async fn execute_transaction(
        &self,
        organization_id: Uuid,
        created_by: Option<Uuid>,
        properties: &ApprovalProperties,
    ) -> Result<wallet_entries::Model, EngineError> {
        let ApprovalProperties::Transaction {
            wallet_id,
            budget_id,
            amount,
            fee,
            currency,
            reference,
            counterparty,
            narration,
        } = properties
        else {
            return Err(ApprovalError::Database(
                "transaction executor invoked with a non-transaction payload".to_string(),
            )
            .into());
        };

        let wallet = self
            .wallets
            .get(organization_id, wallet_id.into_inner())
            .await?;
        let wallet_currency = wallet
            .currency
            .parse::<Currency>()
            .unwrap_or(Currency::Ngn);
        velora_core::ledger::LedgerService::validate_currency(wallet_currency, *currency)?;

        let scope = if budget_id.is_some() {
            EntryScope::BudgetTransfer
        } else {
            EntryScope::WalletTransfer
        };

        let budget_before = match *budget_id {
            Some(b) => Some(self.budgets.get(organization_id, b.into_inner()).await?),
            None => None,
        };

        let entry = self
            .wallets
            .reserve_funds(crate::repositories::ReserveFundsInput {
                organization_id,
                wallet_id: wallet_id.into_inner(),
                budget_id: (*budget_id).map(BudgetId::into_inner),
                project_id: None,
                payroll_payout_id: None,
                created_by,
                scope,
                amount: *amount,
                fee: *fee,
                reference: reference.clone(),
                narration: narration.clone(),
                meta: serde_json::json!({ "counterparty": counterparty }),
                duplicate_window_secs: self.config.duplicate_window_secs,
            })
            .await?;

        if let Some(budget) = budget_before {
            let balance_after = budget.balance - (entry.amount + entry.fee);
            if BudgetService::crosses_threshold(&budget, balance_after) {
                self.notifier
                    .notify(NotificationEvent::BudgetThresholdReached {
                        organization_id: OrganizationId::from_uuid(organization_id),
                        budget_id: budget.id,
                        balance: balance_after,
                    })
                    .await;
            }
        }

        let request = TransferRequest {
            reference: reference.clone(),
            amount: *amount,
            currency: *currency,
            counterparty: counterparty.clone(),
            narration: narration.clone(),
        };

        match self.transfer_provider.initiate_transfer(&request).await {
            Ok(outcome) => {
                if let Some(provider_ref) = &outcome.provider_ref {
                    self.wallets.set_provider_ref(entry.id, provider_ref).await?;
                }
                match outcome.status {
                    TransferStatus::Successful => {
                        self.settle_inline(&entry, SettlementStatus::Successful, outcome.gateway_response)
                            .await
                    }
                    TransferStatus::Failed => {
                        self.settle_inline(&entry, SettlementStatus::Failed, outcome.gateway_response)
                            .await
                    }
                    TransferStatus::Pending => {
                        info!(entry_id = %entry.id, "transfer pending provider settlement");
                        Ok(entry)
                    }
                }
            }
            Err(e) if e.is_retryable() => {
                // The provider never acknowledged the transfer, so nothing
                // is in flight: release the reservation.
                warn!(entry_id = %entry.id, error = %e, "provider unavailable, crediting back");
                self.settle_inline(&entry, SettlementStatus::Failed, Some(e.to_string()))
                    .await
            }
            Err(e) => {
                warn!(entry_id = %entry.id, error = %e, "transfer rejected at initiation");
                self.settle_inline(&entry, SettlementStatus::Failed, Some(e.to_string()))
                    .await
            }
        }
    }

    /// Settles an entry from an immediate provider result by feeding the
    /// same reconciler used for webhooks and requery.
    async fn settle_inline(
        &self,
        entry: &wallet_entries::Model,
        status: SettlementStatus,
        gateway_response: Option<String>,
    ) -> Result<wallet_entries::Model, EngineError> {
        let event = SettlementEvent {
            reference: entry.reference.clone(),
            status,
            amount: entry.amount,
            currency: entry.currency.parse::<Currency>().unwrap_or(Currency::Ngn),
            gateway_response,
        };

        let outcome = self.settlements.process_event(&event).await?;
        self.notify_settlement(&outcome.entry).await;
        Ok(outcome.entry)
    }

    /// Processes a normalized settlement event from the webhook ingress or
    /// the requery worker.
    #[instrument(skip(self, event), fields(reference = %event.reference))]
    pub async fn process_settlement(
        &self,
        event: &SettlementEvent,
    ) -> Result<(), EngineError> {
        let outcome = self.settlements.process_event(event).await?;

        if let Some(budget_id) = outcome.budget_activated {
            self.notifier
                .notify(NotificationEvent::BudgetFunded {
                    organization_id: OrganizationId::from_uuid(outcome.entry.organization_id),
                    budget_id: BudgetId::from_uuid(budget_id),
                    amount: outcome.entry.amount,
                })
                .await;
        }
        self.notify_settlement(&outcome.entry).await;
        Ok(())
    }

    /// One requery sweep: verify entries pending past the threshold and
    /// feed the outcomes to the reconciler.
    ///
    /// Returns how many entries were examined. Provider failures on a
    /// single entry are logged and skipped; the next sweep retries them.
    pub async fn requery_pending(&self, limit: u64) -> Result<usize, EngineError> {
        let threshold = i64::try_from(self.config.requery_after_secs).unwrap_or(3600);
        let cutoff = Utc::now() - Duration::seconds(threshold);
        let entries = self.wallets.find_requeryable(cutoff, limit).await?;
        let count = entries.len();

        for entry in entries {
            let Some(provider_ref) = entry.provider_ref.clone() else {
                continue;
            };

            match self.transfer_provider.verify_transfer(&provider_ref).await {
                Ok(outcome) => {
                    let status = match outcome.status {
                        TransferStatus::Successful => SettlementStatus::Successful,
                        TransferStatus::Failed => SettlementStatus::Failed,
                        // Still in flight; leave the entry untouched.
                        TransferStatus::Pending => continue,
                    };
                    let event = SettlementEvent {
                        reference: entry.reference.clone(),
                        status,
                        amount: entry.amount,
                        currency: entry
                            .currency
                            .parse::<Currency>()
                            .unwrap_or(Currency::Ngn),
                        gateway_response: outcome.gateway_response,
                    };
                    if let Err(e) = self.process_settlement(&event).await {
                        error!(reference = %entry.reference, error = %e, "requery settlement failed");
                    }
                }
                Err(e) => {
                    // Surfaced for the next sweep rather than dropped.
                    warn!(reference = %entry.reference, error = %e, "requery verify failed");
                }
            }
        }

        Ok(count)
    }

    /// Funds and activates a Pending budget, notifying beneficiaries.
    pub async fn fund_budget(
        &self,
        organization_id: Uuid,
        budget_id: Uuid,
        funded_by: Uuid,
    ) -> Result<(), EngineError> {
        let (budget, _entry) = self
            .budgets
            .fund(
                organization_id,
                budget_id,
                funded_by,
                &format!("bgt-fund-{}", Uuid::new_v4()),
            )
            .await?;

        self.notifier
            .notify(NotificationEvent::BudgetFunded {
                organization_id: OrganizationId::from_uuid(organization_id),
                budget_id: BudgetId::from_uuid(budget.id),
                amount: budget.amount,
            })
            .await;
        Ok(())
    }

    /// Closes a budget and notifies about the returned remainder.
    pub async fn close_budget(
        &self,
        organization_id: Uuid,
        budget_id: Uuid,
        closed_by: Uuid,
    ) -> Result<(), EngineError> {
        let (_budget, remainder) = self
            .budgets
            .close(
                organization_id,
                budget_id,
                closed_by,
                &format!("bgt-close-{}", Uuid::new_v4()),
            )
            .await?;

        self.notifier
            .notify(NotificationEvent::BudgetClosed {
                organization_id: OrganizationId::from_uuid(organization_id),
                budget_id: BudgetId::from_uuid(budget_id),
                remainder,
            })
            .await;
        Ok(())
    }

    /// Marks a pending payroll batch approved for processing.
    async fn approve_payroll(&self, payroll_payout_id: Uuid) -> Result<(), EngineError> {
        payroll_payouts::Entity::update_many()
            .col_expr(
                payroll_payouts::Column::Status,
                Expr::value(PayrollStatus::Approved),
            )
            .col_expr(payroll_payouts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(payroll_payouts::Column::Id.eq(payroll_payout_id))
            .filter(payroll_payouts::Column::Status.eq(PayrollStatus::Pending))
            .exec(&self.db)
            .await
            .map_err(|e| EngineError::Approval(ApprovalError::Database(e.to_string())))?;
        Ok(())
    }

    async fn notify_settlement(&self, entry: &wallet_entries::Model) {
        self.notifier
            .notify(NotificationEvent::TransferSettled {
                organization_id: OrganizationId::from_uuid(entry.organization_id),
                entry_id: WalletEntryId::from_uuid(entry.id),
                status: to_core_entry_status(&entry.status),
            })
            .await;
    }
}

impl From<EngineError> for velora_shared::AppError {
    fn from(e: EngineError) -> Self {
        use velora_shared::AppError;

        let message = e.to_string();
        match &e {
            EngineError::Ledger(
                LedgerError::WalletNotFound(_) | LedgerError::EntryNotFound(_),
            )
            | EngineError::Budget(BudgetError::NotFound(_))
            | EngineError::Approval(
                ApprovalError::RequestNotFound(_) | ApprovalError::RuleNotFound(_),
            )
            | EngineError::Settlement(SettlementError::EntryNotFound(_)) => {
                AppError::NotFound(message)
            }

            EngineError::Ledger(LedgerError::DuplicateTransferAttempt)
            | EngineError::Approval(
                ApprovalError::AlreadyReviewed(_) | ApprovalError::AlreadyResolved { .. },
            ) => AppError::Conflict(message),

            EngineError::Counterparty(CounterpartyError::ProviderUnavailable(_)) => {
                AppError::Provider(message)
            }
            EngineError::Counterparty(CounterpartyError::InvalidAccount { .. }) => {
                AppError::Validation(message)
            }

            EngineError::Ledger(LedgerError::Database(_))
            | EngineError::Budget(BudgetError::Database(_))
            | EngineError::Policy(PolicyError::Database(_))
            | EngineError::Approval(ApprovalError::Database(_))
            | EngineError::Counterparty(CounterpartyError::Database(_))
            | EngineError::Settlement(SettlementError::Database(_)) => {
                AppError::Database(message)
            }

            _ => AppError::BusinessRule(message),
        }
    }
}

/// Policy violations report in a fixed precedence: calendar, spend limit,
/// invoice.
const fn first_violation(calendar: bool, spend_limit: bool, invoice: bool) -> Option<PolicyViolation> {
    if calendar {
        Some(PolicyViolation::Calendar)
    } else if spend_limit {
        Some(PolicyViolation::SpendLimit)
    } else if invoice {
        Some(PolicyViolation::Invoice)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use velora_shared::AppError;

    #[test]
    fn test_engine_error_maps_to_app_error() {
        let e: AppError = EngineError::Ledger(LedgerError::DuplicateTransferAttempt).into();
        assert_eq!(e.status_code(), 409);

        let e: AppError = EngineError::Ledger(LedgerError::InsufficientFunds {
            available: 0,
            requested: 1,
        })
        .into();
        assert_eq!(e.status_code(), 422);

        let e: AppError = EngineError::Counterparty(
            CounterpartyError::ProviderUnavailable("timeout".into()),
        )
        .into();
        assert_eq!(e.status_code(), 502);

        let e: AppError =
            EngineError::Budget(BudgetError::NotFound(Uuid::nil())).into();
        assert_eq!(e.status_code(), 404);
    }

    #[test]
    fn test_first_violation_precedence() {
        assert_eq!(first_violation(false, false, false), None);
        assert_eq!(
            first_violation(true, true, true),
            Some(PolicyViolation::Calendar)
        );
        assert_eq!(
            first_violation(false, true, true),
            Some(PolicyViolation::SpendLimit)
        );
        assert_eq!(
            first_violation(false, false, true),
            Some(PolicyViolation::Invoice)
        );
    }
}
