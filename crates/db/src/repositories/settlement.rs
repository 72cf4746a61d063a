//! Settlement reconciler: drives pending entries to a terminal state.
//!
//! Events arrive at-least-once from webhooks or the requery worker. Every
//! transition is guarded by a conditional update on the entry's current
//! status, so duplicate deliveries and racing workers collapse to no-ops.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use velora_core::ledger::{EntryStatus as CoreEntryStatus, LedgerError};
use velora_core::settlement::{
    SettlementAction, SettlementError, SettlementEvent, SettlementService,
};

use crate::entities::{
    budgets, wallet_entries,
    sea_orm_active_enums::{BudgetStatus, EntryScope, EntryStatus, EntryType},
};

use super::budget::credit_project;
use super::wallet::{credit_budget, credit_wallet};

/// What a processed event did.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    /// The entry the event targeted.
    pub entry: wallet_entries::Model,
    /// The action the reconciler applied.
    pub action: SettlementAction,
    /// Budget activated by a first-time funding confirmation, when any.
    pub budget_activated: Option<Uuid>,
}

/// Settlement repository.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
}

impl SettlementRepository {
    /// Creates a new settlement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Processes one normalized settlement event.
    ///
    /// Lookup failure aborts without mutating state. An entry already out
    /// of Pending (or already stamped for reversal) makes the event a
    /// no-op success, which is what makes duplicate webhook delivery and
    /// duplicate requery safe.
    #[instrument(skip(self, event), fields(reference = %event.reference, status = %event.status))]
    pub async fn process_event(
        &self,
        event: &SettlementEvent,
    ) -> Result<SettlementOutcome, SettlementError> {
        let entry = wallet_entries::Entity::find()
            .filter(wallet_entries::Column::Reference.eq(event.reference.as_str()))
            .one(&self.db)
            .await
            .map_err(settlement_db_err)?
            .ok_or_else(|| {
                warn!(reference = %event.reference, "settlement event for unknown reference");
                SettlementError::EntryNotFound(event.reference.clone())
            })?;

        let action = SettlementService::decide(
            to_core_entry_status(&entry.status),
            entry.reversed_at.is_some(),
            event.status,
            entry.amount + entry.fee,
        );

        match action {
            SettlementAction::AlreadySettled => {
                info!(entry_id = %entry.id, "duplicate settlement delivery, no-op");
                Ok(SettlementOutcome {
                    entry,
                    action,
                    budget_activated: None,
                })
            }
            SettlementAction::MarkSuccessful => self.mark_successful(entry, event).await,
            SettlementAction::CreditBack { amount } => {
                self.credit_back(entry, event, amount).await
            }
            SettlementAction::Compensate { amount } => self.compensate(entry, event, amount).await,
        }
    }

    /// `Pending → Successful`, plus the scope-specific confirm hook.
    async fn mark_successful(
        &self,
        entry: wallet_entries::Model,
        event: &SettlementEvent,
    ) -> Result<SettlementOutcome, SettlementError> {
        let txn = self.db.begin().await.map_err(settlement_db_err)?;

        if !transition_entry(&txn, entry.id, EntryStatus::Successful, event).await? {
            // A concurrent delivery settled it first.
            txn.rollback().await.map_err(settlement_db_err)?;
            return Ok(SettlementOutcome {
                entry,
                action: SettlementAction::AlreadySettled,
                budget_activated: None,
            });
        }

        let budget_activated = self.confirm_scope(&txn, &entry).await?;

        txn.commit().await.map_err(settlement_db_err)?;
        info!(entry_id = %entry.id, "entry settled successful");

        let entry = self.reload(entry.id).await?;
        Ok(SettlementOutcome {
            entry,
            action: SettlementAction::MarkSuccessful,
            budget_activated,
        })
    }

    /// `Pending → Failed` with the reservation credited back in the same
    /// transaction.
    async fn credit_back(
        &self,
        entry: wallet_entries::Model,
        event: &SettlementEvent,
        amount: i64,
    ) -> Result<SettlementOutcome, SettlementError> {
        let txn = self.db.begin().await.map_err(settlement_db_err)?;

        if !transition_entry(&txn, entry.id, EntryStatus::Failed, event).await? {
            txn.rollback().await.map_err(settlement_db_err)?;
            return Ok(SettlementOutcome {
                entry,
                action: SettlementAction::AlreadySettled,
                budget_activated: None,
            });
        }

        credit_wallet(&txn, entry.wallet_id, amount)
            .await
            .map_err(ledger_to_settlement_err)?;

        if let Some(budget_id) = entry.budget_id {
            credit_budget(&txn, budget_id, amount)
                .await
                .map_err(ledger_to_settlement_err)?;
        }

        txn.commit().await.map_err(settlement_db_err)?;
        info!(entry_id = %entry.id, amount, "entry failed, reservation credited back");

        let entry = self.reload(entry.id).await?;
        Ok(SettlementOutcome {
            entry,
            action: SettlementAction::CreditBack { amount },
            budget_activated: None,
        })
    }

    /// Reversal of a settled entry: stamp the marker and record a new
    /// compensating Credit entry referencing the original. History is
    /// never mutated.
    async fn compensate(
        &self,
        entry: wallet_entries::Model,
        event: &SettlementEvent,
        amount: i64,
    ) -> Result<SettlementOutcome, SettlementError> {
        let txn = self.db.begin().await.map_err(settlement_db_err)?;

        // The stamp is the idempotency guard: only one delivery wins it.
        let stamped = wallet_entries::Entity::update_many()
            .col_expr(
                wallet_entries::Column::ReversedAt,
                Expr::value(Utc::now()),
            )
            .col_expr(wallet_entries::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(wallet_entries::Column::Id.eq(entry.id))
            .filter(wallet_entries::Column::ReversedAt.is_null())
            .exec(&txn)
            .await
            .map_err(settlement_db_err)?;

        if stamped.rows_affected == 0 {
            txn.rollback().await.map_err(settlement_db_err)?;
            return Ok(SettlementOutcome {
                entry,
                action: SettlementAction::AlreadySettled,
                budget_activated: None,
            });
        }

        let wallet = credit_wallet(&txn, entry.wallet_id, amount)
            .await
            .map_err(ledger_to_settlement_err)?;

        if let Some(budget_id) = entry.budget_id {
            credit_budget(&txn, budget_id, amount)
                .await
                .map_err(ledger_to_settlement_err)?;
        }

        let now = Utc::now();
        wallet_entries::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(entry.organization_id),
            wallet_id: Set(entry.wallet_id),
            budget_id: Set(entry.budget_id),
            project_id: Set(entry.project_id),
            payroll_payout_id: Set(entry.payroll_payout_id),
            entry_type: Set(EntryType::Credit),
            status: Set(EntryStatus::Successful),
            scope: Set(entry.scope.clone()),
            amount: Set(amount),
            fee: Set(0),
            currency: Set(entry.currency.clone()),
            balance_before: Set(wallet.balance - amount),
            balance_after: Set(wallet.balance),
            ledger_balance_before: Set(wallet.ledger_balance - amount),
            ledger_balance_after: Set(wallet.ledger_balance),
            reference: Set(format!("{}-reversal", entry.reference)),
            provider_ref: Set(entry.provider_ref.clone()),
            narration: Set(Some(format!("Reversal of {}", entry.reference))),
            meta: Set(entry.meta.clone()),
            reverses: Set(Some(entry.id)),
            reversed_at: Set(None),
            settled_at: Set(Some(now.into())),
            gateway_response: Set(event.gateway_response.clone()),
            created_by: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(settlement_db_err)?;

        txn.commit().await.map_err(settlement_db_err)?;
        info!(entry_id = %entry.id, amount, "reversal compensated");

        let entry = self.reload(entry.id).await?;
        Ok(SettlementOutcome {
            entry,
            action: SettlementAction::Compensate { amount },
            budget_activated: None,
        })
    }

    /// Scope-specific confirm side effects for a successful settlement.
    async fn confirm_scope(
        &self,
        txn: &DatabaseTransaction,
        entry: &wallet_entries::Model,
    ) -> Result<Option<Uuid>, SettlementError> {
        match entry.scope {
            // First-time funding confirmation activates the budget.
            EntryScope::BudgetFunding => {
                let Some(budget_id) = entry.budget_id else {
                    return Err(SettlementError::OwnerNotFound(
                        "budget_funding entry without budget".to_string(),
                    ));
                };

                let activated = budgets::Entity::update_many()
                    .col_expr(budgets::Column::Balance, Expr::value(entry.amount))
                    .col_expr(budgets::Column::Status, Expr::value(BudgetStatus::Active))
                    .col_expr(budgets::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(budgets::Column::Id.eq(budget_id))
                    .filter(budgets::Column::Status.eq(BudgetStatus::Pending))
                    .exec(txn)
                    .await
                    .map_err(settlement_db_err)?;

                Ok((activated.rows_affected > 0).then_some(budget_id))
            }
            // A confirmed closure credits the parent wallet or project.
            EntryScope::BudgetClosure => {
                match entry.project_id {
                    Some(project_id) => credit_project(txn, project_id, entry.amount)
                        .await
                        .map_err(ledger_to_settlement_err)?,
                    None => {
                        credit_wallet(txn, entry.wallet_id, entry.amount)
                            .await
                            .map_err(ledger_to_settlement_err)?;
                    }
                }
                Ok(None)
            }
            EntryScope::WalletTransfer
            | EntryScope::BudgetTransfer
            | EntryScope::BudgetExtension
            | EntryScope::PayrollPayout => Ok(None),
        }
    }

    async fn reload(&self, entry_id: Uuid) -> Result<wallet_entries::Model, SettlementError> {
        wallet_entries::Entity::find_by_id(entry_id)
            .one(&self.db)
            .await
            .map_err(settlement_db_err)?
            .ok_or_else(|| SettlementError::OwnerNotFound(format!("entry {entry_id}")))
    }
}

/// Guarded `Pending → terminal` transition. Returns false when the entry
/// already left Pending, which callers treat as a duplicate delivery.
async fn transition_entry(
    txn: &DatabaseTransaction,
    entry_id: Uuid,
    to: EntryStatus,
    event: &SettlementEvent,
) -> Result<bool, SettlementError> {
    let now = Utc::now();
    let result = wallet_entries::Entity::update_many()
        .col_expr(wallet_entries::Column::Status, Expr::value(to))
        .col_expr(wallet_entries::Column::SettledAt, Expr::value(now))
        .col_expr(
            wallet_entries::Column::GatewayResponse,
            Expr::value(event.gateway_response.clone()),
        )
        .col_expr(wallet_entries::Column::UpdatedAt, Expr::value(now))
        .filter(wallet_entries::Column::Id.eq(entry_id))
        .filter(wallet_entries::Column::Status.eq(EntryStatus::Pending))
        .exec(txn)
        .await
        .map_err(settlement_db_err)?;

    Ok(result.rows_affected > 0)
}

/// Maps a database entry status into the core enum.
pub(crate) fn to_core_entry_status(status: &EntryStatus) -> CoreEntryStatus {
    match status {
        EntryStatus::Pending => CoreEntryStatus::Pending,
        EntryStatus::Successful => CoreEntryStatus::Successful,
        EntryStatus::Failed => CoreEntryStatus::Failed,
    }
}

fn settlement_db_err(e: DbErr) -> SettlementError {
    SettlementError::Database(e.to_string())
}

fn ledger_to_settlement_err(e: LedgerError) -> SettlementError {
    match e {
        LedgerError::WalletNotFound(id) => SettlementError::OwnerNotFound(format!("wallet {id}")),
        other => SettlementError::Database(other.to_string()),
    }
}
