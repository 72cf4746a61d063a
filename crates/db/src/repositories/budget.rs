//! Budget repository: creation, funding, extension, closure, pause.
//!
//! Funding, extension, and closure follow the same reserve/confirm pattern
//! as transfers, but the movement is internal (wallet to budget), so the
//! entry settles in the same transaction that moves the money.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use velora_core::budget::{Beneficiary, Budget, BudgetError, BudgetService, BudgetStatus};
use velora_core::ledger::LedgerError;

use crate::entities::{
    budget_beneficiaries, budgets, projects, wallet_entries, wallets,
    sea_orm_active_enums::{
        BudgetStatus as DbBudgetStatus, EntryScope, EntryStatus, EntryType,
    },
};

use super::wallet::{credit_wallet, db_err};
use velora_shared::types::{
    BudgetId, Currency, OrganizationId, ProjectId, UserId, WalletId,
};

/// Input for creating a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetInput {
    /// Owning organization.
    pub organization_id: Uuid,
    /// Wallet the budget is carved from.
    pub wallet_id: Uuid,
    /// Parent project, when any.
    pub project_id: Option<Uuid>,
    /// Budget name.
    pub name: String,
    /// Approved ceiling in minor units.
    pub amount: i64,
    /// Low-balance notification threshold.
    pub threshold: Option<i64>,
    /// Beneficiaries with optional allocation caps.
    pub beneficiaries: Vec<(Uuid, Option<i64>)>,
    /// Requesting user.
    pub created_by: Uuid,
}

/// Budget repository.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a Pending budget with its beneficiaries.
    pub async fn create(&self, input: CreateBudgetInput) -> Result<budgets::Model, BudgetError> {
        let wallet = wallets::Entity::find_by_id(input.wallet_id)
            .filter(wallets::Column::OrganizationId.eq(input.organization_id))
            .one(&self.db)
            .await
            .map_err(budget_db_err)?
            .ok_or(BudgetError::NotFound(input.wallet_id))?;

        let txn = self.db.begin().await.map_err(budget_db_err)?;
        let now = Utc::now();

        let budget = budgets::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(input.organization_id),
            wallet_id: Set(input.wallet_id),
            project_id: Set(input.project_id),
            name: Set(input.name.clone()),
            currency: Set(wallet.currency),
            amount: Set(input.amount),
            balance: Set(0),
            amount_used: Set(0),
            status: Set(DbBudgetStatus::Pending),
            threshold: Set(input.threshold),
            created_by: Set(input.created_by),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(budget_db_err)?;

        for (user_id, allocation) in &input.beneficiaries {
            budget_beneficiaries::ActiveModel {
                id: Set(Uuid::new_v4()),
                budget_id: Set(budget.id),
                user_id: Set(*user_id),
                allocation: Set(*allocation),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await
            .map_err(budget_db_err)?;
        }

        txn.commit().await.map_err(budget_db_err)?;
        Ok(budget)
    }

    /// Loads a budget with its beneficiaries as a core domain value.
    pub async fn get(
        &self,
        organization_id: Uuid,
        budget_id: Uuid,
    ) -> Result<Budget, BudgetError> {
        let budget = budgets::Entity::find_by_id(budget_id)
            .filter(budgets::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await
            .map_err(budget_db_err)?
            .ok_or(BudgetError::NotFound(budget_id))?;

        let beneficiaries = budget_beneficiaries::Entity::find()
            .filter(budget_beneficiaries::Column::BudgetId.eq(budget_id))
            .order_by_asc(budget_beneficiaries::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(budget_db_err)?;

        Ok(to_core_budget(&budget, &beneficiaries))
    }

    /// Funds a Pending budget and activates it.
    ///
    /// One transaction: conditional wallet debit of `amount`, the settled
    /// BudgetFunding entry, and the budget flip to Active with
    /// `balance = amount`.
    #[instrument(skip(self), fields(budget_id = %budget_id))]
    pub async fn fund(
        &self,
        organization_id: Uuid,
        budget_id: Uuid,
        funded_by: Uuid,
        reference: &str,
    ) -> Result<(budgets::Model, wallet_entries::Model), BudgetError> {
        let budget = self.get(organization_id, budget_id).await?;
        BudgetService::validate_funding(&budget)?;

        let txn = self.db.begin().await.map_err(budget_db_err)?;

        let entry = debit_wallet_settled(
            &txn,
            organization_id,
            budget.wallet_id.into_inner(),
            Some(budget_id),
            budget.project_id.map(ProjectId::into_inner),
            funded_by,
            budget.amount,
            EntryScope::BudgetFunding,
            reference,
        )
        .await
        .map_err(ledger_to_budget_err)?;

        let now = Utc::now();
        let updated = budgets::Entity::update_many()
            .col_expr(budgets::Column::Balance, Expr::value(budget.amount))
            .col_expr(
                budgets::Column::Status,
                Expr::value(DbBudgetStatus::Active),
            )
            .col_expr(budgets::Column::UpdatedAt, Expr::value(now))
            .filter(budgets::Column::Id.eq(budget_id))
            .filter(budgets::Column::Status.eq(DbBudgetStatus::Pending))
            .exec(&txn)
            .await
            .map_err(budget_db_err)?;

        if updated.rows_affected == 0 {
            // A concurrent funding won; abort so nothing double-debits.
            return Err(BudgetError::InvalidTransition {
                from: BudgetStatus::Active,
                to: BudgetStatus::Active,
            });
        }

        txn.commit().await.map_err(budget_db_err)?;
        info!(budget_id = %budget_id, amount = budget.amount, "budget funded");

        let model = budgets::Entity::find_by_id(budget_id)
            .one(&self.db)
            .await
            .map_err(budget_db_err)?
            .ok_or(BudgetError::NotFound(budget_id))?;
        Ok((model, entry))
    }

    /// Extends an Active budget by `additional` minor units.
    #[instrument(skip(self), fields(budget_id = %budget_id))]
    pub async fn extend(
        &self,
        organization_id: Uuid,
        budget_id: Uuid,
        additional: i64,
        extended_by: Uuid,
        reference: &str,
    ) -> Result<(budgets::Model, wallet_entries::Model), BudgetError> {
        let budget = self.get(organization_id, budget_id).await?;
        let plan = BudgetService::plan_extension(&budget, additional)?;

        let txn = self.db.begin().await.map_err(budget_db_err)?;

        let entry = debit_wallet_settled(
            &txn,
            organization_id,
            budget.wallet_id.into_inner(),
            Some(budget_id),
            budget.project_id.map(ProjectId::into_inner),
            extended_by,
            additional,
            EntryScope::BudgetExtension,
            reference,
        )
        .await
        .map_err(ledger_to_budget_err)?;

        budgets::Entity::update_many()
            .col_expr(budgets::Column::Amount, Expr::value(plan.amount))
            .col_expr(budgets::Column::Balance, Expr::value(plan.balance))
            .col_expr(budgets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(budgets::Column::Id.eq(budget_id))
            .exec(&txn)
            .await
            .map_err(budget_db_err)?;

        txn.commit().await.map_err(budget_db_err)?;

        let model = budgets::Entity::find_by_id(budget_id)
            .one(&self.db)
            .await
            .map_err(budget_db_err)?
            .ok_or(BudgetError::NotFound(budget_id))?;
        Ok((model, entry))
    }

    /// Closes a budget, returning the remainder to the wallet or project.
    #[instrument(skip(self), fields(budget_id = %budget_id))]
    pub async fn close(
        &self,
        organization_id: Uuid,
        budget_id: Uuid,
        closed_by: Uuid,
        reference: &str,
    ) -> Result<(budgets::Model, i64), BudgetError> {
        let budget = self.get(organization_id, budget_id).await?;
        let plan = BudgetService::plan_closure(&budget)?;

        let txn = self.db.begin().await.map_err(budget_db_err)?;

        if plan.remainder > 0 {
            match budget.project_id {
                Some(project_id) => {
                    credit_project(&txn, project_id.into_inner(), plan.remainder)
                        .await
                        .map_err(ledger_to_budget_err)?;
                }
                None => {
                    let wallet =
                        credit_wallet(&txn, budget.wallet_id.into_inner(), plan.remainder)
                            .await
                            .map_err(ledger_to_budget_err)?;

                    let now = Utc::now();
                    wallet_entries::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        organization_id: Set(organization_id),
                        wallet_id: Set(wallet.id),
                        budget_id: Set(Some(budget_id)),
                        project_id: Set(None),
                        payroll_payout_id: Set(None),
                        entry_type: Set(EntryType::Credit),
                        status: Set(EntryStatus::Successful),
                        scope: Set(EntryScope::BudgetClosure),
                        amount: Set(plan.remainder),
                        fee: Set(0),
                        currency: Set(wallet.currency.clone()),
                        balance_before: Set(wallet.balance - plan.remainder),
                        balance_after: Set(wallet.balance),
                        ledger_balance_before: Set(wallet.ledger_balance - plan.remainder),
                        ledger_balance_after: Set(wallet.ledger_balance),
                        reference: Set(reference.to_string()),
                        provider_ref: Set(None),
                        narration: Set(Some(format!("Closure of budget {}", budget.name))),
                        meta: Set(serde_json::json!({})),
                        reverses: Set(None),
                        reversed_at: Set(None),
                        settled_at: Set(Some(now.into())),
                        gateway_response: Set(None),
                        created_by: Set(Some(closed_by)),
                        created_at: Set(now.into()),
                        updated_at: Set(now.into()),
                    }
                    .insert(&txn)
                    .await
                    .map_err(budget_db_err)?;
                }
            }
        }

        budgets::Entity::update_many()
            .col_expr(budgets::Column::Balance, Expr::value(0i64))
            .col_expr(
                budgets::Column::Status,
                Expr::value(DbBudgetStatus::Closed),
            )
            .col_expr(budgets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(budgets::Column::Id.eq(budget_id))
            .exec(&txn)
            .await
            .map_err(budget_db_err)?;

        txn.commit().await.map_err(budget_db_err)?;
        info!(budget_id = %budget_id, remainder = plan.remainder, "budget closed");

        let model = budgets::Entity::find_by_id(budget_id)
            .one(&self.db)
            .await
            .map_err(budget_db_err)?
            .ok_or(BudgetError::NotFound(budget_id))?;
        Ok((model, plan.remainder))
    }

    /// Pauses an Active budget.
    pub async fn pause(&self, organization_id: Uuid, budget_id: Uuid) -> Result<(), BudgetError> {
        let budget = self.get(organization_id, budget_id).await?;
        BudgetService::validate_pause(budget.status)?;
        self.set_status(budget_id, DbBudgetStatus::Paused).await
    }

    /// Unpauses a Paused budget.
    pub async fn unpause(
        &self,
        organization_id: Uuid,
        budget_id: Uuid,
    ) -> Result<(), BudgetError> {
        let budget = self.get(organization_id, budget_id).await?;
        BudgetService::validate_unpause(budget.status)?;
        self.set_status(budget_id, DbBudgetStatus::Active).await
    }

    async fn set_status(&self, budget_id: Uuid, status: DbBudgetStatus) -> Result<(), BudgetError> {
        budgets::Entity::update_many()
            .col_expr(budgets::Column::Status, Expr::value(status))
            .col_expr(budgets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(budgets::Column::Id.eq(budget_id))
            .exec(&self.db)
            .await
            .map_err(budget_db_err)?;
        Ok(())
    }

    /// A beneficiary's successful+pending spend inside a budget.
    pub async fn spent_by_user(
        &self,
        budget_id: Uuid,
        user_id: Uuid,
    ) -> Result<i64, BudgetError> {
        let entries = wallet_entries::Entity::find()
            .filter(wallet_entries::Column::BudgetId.eq(budget_id))
            .filter(wallet_entries::Column::CreatedBy.eq(user_id))
            .filter(wallet_entries::Column::EntryType.eq(EntryType::Debit))
            .filter(
                wallet_entries::Column::Status
                    .is_in([EntryStatus::Pending, EntryStatus::Successful]),
            )
            .all(&self.db)
            .await
            .map_err(budget_db_err)?;

        Ok(entries.iter().map(|e| e.amount + e.fee).sum())
    }
}

/// Debit a wallet and insert an already-settled entry, inside `txn`.
///
/// Internal movements (funding, extension) settle synchronously: no
/// provider is involved, so the entry never waits in Pending.
#[allow(clippy::too_many_arguments)]
async fn debit_wallet_settled(
    txn: &DatabaseTransaction,
    organization_id: Uuid,
    wallet_id: Uuid,
    budget_id: Option<Uuid>,
    project_id: Option<Uuid>,
    created_by: Uuid,
    amount: i64,
    scope: EntryScope,
    reference: &str,
) -> Result<wallet_entries::Model, LedgerError> {
    let result = wallets::Entity::update_many()
        .col_expr(
            wallets::Column::Balance,
            Expr::col(wallets::Column::Balance).sub(amount),
        )
        .col_expr(
            wallets::Column::LedgerBalance,
            Expr::col(wallets::Column::LedgerBalance).sub(amount),
        )
        .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(wallets::Column::Id.eq(wallet_id))
        .filter(wallets::Column::OrganizationId.eq(organization_id))
        .filter(wallets::Column::Balance.gte(amount))
        .exec(txn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        let wallet = wallets::Entity::find_by_id(wallet_id)
            .one(txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::WalletNotFound(wallet_id))?;
        return Err(LedgerError::InsufficientFunds {
            available: wallet.balance,
            requested: amount,
        });
    }

    let wallet = wallets::Entity::find_by_id(wallet_id)
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(LedgerError::WalletNotFound(wallet_id))?;

    let now = Utc::now();
    wallet_entries::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(organization_id),
        wallet_id: Set(wallet_id),
        budget_id: Set(budget_id),
        project_id: Set(project_id),
        payroll_payout_id: Set(None),
        entry_type: Set(EntryType::Debit),
        status: Set(EntryStatus::Successful),
        scope: Set(scope),
        amount: Set(amount),
        fee: Set(0),
        currency: Set(wallet.currency.clone()),
        balance_before: Set(wallet.balance + amount),
        balance_after: Set(wallet.balance),
        ledger_balance_before: Set(wallet.ledger_balance + amount),
        ledger_balance_after: Set(wallet.ledger_balance),
        reference: Set(reference.to_string()),
        provider_ref: Set(None),
        narration: Set(None),
        meta: Set(serde_json::json!({})),
        reverses: Set(None),
        reversed_at: Set(None),
        settled_at: Set(Some(now.into())),
        gateway_response: Set(None),
        created_by: Set(Some(created_by)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => LedgerError::DuplicateTransferAttempt,
        _ => db_err(e),
    })
}

/// Credit a project balance inside an existing transaction.
pub(crate) async fn credit_project(
    txn: &DatabaseTransaction,
    project_id: Uuid,
    amount: i64,
) -> Result<(), LedgerError> {
    projects::Entity::update_many()
        .col_expr(
            projects::Column::Balance,
            Expr::col(projects::Column::Balance).add(amount),
        )
        .col_expr(projects::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(projects::Column::Id.eq(project_id))
        .exec(txn)
        .await
        .map_err(db_err)?;
    Ok(())
}

/// Maps a budget row and its beneficiaries into the core domain type.
pub(crate) fn to_core_budget(
    model: &budgets::Model,
    beneficiaries: &[budget_beneficiaries::Model],
) -> Budget {
    Budget {
        id: BudgetId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        wallet_id: WalletId::from_uuid(model.wallet_id),
        project_id: model.project_id.map(ProjectId::from_uuid),
        name: model.name.clone(),
        amount: model.amount,
        balance: model.balance,
        amount_used: model.amount_used,
        status: to_core_budget_status(&model.status),
        threshold: model.threshold,
        beneficiaries: beneficiaries
            .iter()
            .map(|b| Beneficiary {
                user_id: UserId::from_uuid(b.user_id),
                allocation: b.allocation,
            })
            .collect(),
        currency: model
            .currency
            .parse::<Currency>()
            .unwrap_or(Currency::Ngn),
        created_by: UserId::from_uuid(model.created_by),
        created_at: model.created_at.to_utc(),
        updated_at: model.updated_at.to_utc(),
    }
}

/// Maps a database budget status into the core enum.
pub(crate) fn to_core_budget_status(status: &DbBudgetStatus) -> BudgetStatus {
    match status {
        DbBudgetStatus::Pending => BudgetStatus::Pending,
        DbBudgetStatus::Active => BudgetStatus::Active,
        DbBudgetStatus::Paused => BudgetStatus::Paused,
        DbBudgetStatus::Closed => BudgetStatus::Closed,
    }
}

fn budget_db_err(e: DbErr) -> BudgetError {
    BudgetError::Database(e.to_string())
}

/// Maps ledger-layer failures surfaced during budget movements.
fn ledger_to_budget_err(e: LedgerError) -> BudgetError {
    match e {
        LedgerError::InsufficientFunds {
            available,
            requested,
        } => BudgetError::InsufficientBalance {
            available,
            requested,
        },
        other => BudgetError::Database(other.to_string()),
    }
}
