//! Wallet repository: fund reservation, credits, and statement queries.
//!
//! The only way a balance changes is a conditional (compare-and-swap)
//! update executed in the same transaction as the ledger entry write.
//! Two concurrent debits race on that conditional update; exactly one wins
//! when the balance can satisfy only one.

use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use velora_core::ledger::{LedgerError, LedgerService};
use velora_shared::types::{PageRequest, PageResponse};

use crate::entities::{
    budgets, wallet_entries, wallets,
    sea_orm_active_enums::{EntryScope, EntryStatus, EntryType},
};

/// Input for reserving funds against a wallet (and optionally a budget).
#[derive(Debug, Clone)]
pub struct ReserveFundsInput {
    /// Owning organization.
    pub organization_id: Uuid,
    /// Wallet to debit.
    pub wallet_id: Uuid,
    /// Budget to debit alongside, when budget-scoped.
    pub budget_id: Option<Uuid>,
    /// Project reference, when project-scoped.
    pub project_id: Option<Uuid>,
    /// Payroll payout reference, for payroll entries.
    pub payroll_payout_id: Option<Uuid>,
    /// User initiating the movement.
    pub created_by: Option<Uuid>,
    /// Business purpose of the entry.
    pub scope: EntryScope,
    /// Amount in minor units.
    pub amount: i64,
    /// Fee in minor units.
    pub fee: i64,
    /// Caller-chosen idempotency key.
    pub reference: String,
    /// Statement narration.
    pub narration: Option<String>,
    /// Scope-specific payload.
    pub meta: serde_json::Value,
    /// Rolling duplicate-submission window in seconds; 0 disables the check.
    pub duplicate_window_secs: u64,
}

/// Filter options for listing wallet entries.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Filter by status.
    pub status: Option<EntryStatus>,
    /// Filter by scope.
    pub scope: Option<EntryScope>,
    /// Entries created at or after this instant.
    pub from: Option<chrono::DateTime<Utc>>,
    /// Entries created at or before this instant.
    pub to: Option<chrono::DateTime<Utc>>,
}

/// Wallet repository.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetches a wallet scoped to its organization.
    pub async fn get(
        &self,
        organization_id: Uuid,
        wallet_id: Uuid,
    ) -> Result<wallets::Model, LedgerError> {
        wallets::Entity::find_by_id(wallet_id)
            .filter(wallets::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::WalletNotFound(wallet_id))
    }

    /// Atomically reserves `amount + fee` and records the Pending entry.
    ///
    /// The wallet decrement is a conditional update (`balance >= total` at
    /// write time); the entry insert rides the same transaction, so nothing
    /// is reserved without its entry and vice versa. When `budget_id` is
    /// set, the budget balance is decremented under the same guard.
    ///
    /// # Errors
    ///
    /// - `DuplicateTransferAttempt` when the same user submitted the same
    ///   amount inside the rolling window, or the reference already exists
    /// - `InsufficientFunds` when the conditional update loses
    /// - `WalletNotFound` when the wallet does not exist
    #[instrument(skip(self, input), fields(reference = %input.reference))]
    pub async fn reserve_funds(
        &self,
        input: ReserveFundsInput,
    ) -> Result<wallet_entries::Model, LedgerError> {
        let total = LedgerService::validate_total(input.amount, input.fee)?;

        // Best-effort duplicate window scan before any reservation. The
        // unique reference index below is the authoritative guard.
        if input.duplicate_window_secs > 0 {
            self.check_duplicate_window(&input).await?;
        }

        let txn = self.db.begin().await.map_err(db_err)?;

        let wallet = self
            .debit_wallet(&txn, input.organization_id, input.wallet_id, total)
            .await?;

        if let Some(budget_id) = input.budget_id {
            debit_budget(&txn, budget_id, total).await?;
        }

        let now = Utc::now();
        let entry = wallet_entries::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(input.organization_id),
            wallet_id: Set(input.wallet_id),
            budget_id: Set(input.budget_id),
            project_id: Set(input.project_id),
            payroll_payout_id: Set(input.payroll_payout_id),
            entry_type: Set(EntryType::Debit),
            status: Set(EntryStatus::Pending),
            scope: Set(input.scope),
            amount: Set(input.amount),
            fee: Set(input.fee),
            currency: Set(wallet.currency.clone()),
            balance_before: Set(wallet.balance + total),
            balance_after: Set(wallet.balance),
            ledger_balance_before: Set(wallet.ledger_balance + total),
            ledger_balance_after: Set(wallet.ledger_balance),
            reference: Set(input.reference.clone()),
            provider_ref: Set(None),
            narration: Set(input.narration.clone()),
            meta: Set(input.meta.clone()),
            reverses: Set(None),
            reversed_at: Set(None),
            settled_at: Set(None),
            gateway_response: Set(None),
            created_by: Set(input.created_by),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let entry = entry.insert(&txn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => LedgerError::DuplicateTransferAttempt,
            _ => db_err(e),
        })?;

        txn.commit().await.map_err(db_err)?;

        debug!(entry_id = %entry.id, total, "funds reserved");
        Ok(entry)
    }

    /// Conditional wallet decrement. Returns the wallet as of after the
    /// update so the caller can record before/after balances.
    async fn debit_wallet(
        &self,
        txn: &DatabaseTransaction,
        organization_id: Uuid,
        wallet_id: Uuid,
        total: i64,
    ) -> Result<wallets::Model, LedgerError> {
        let result = wallets::Entity::update_many()
            .col_expr(
                wallets::Column::Balance,
                Expr::col(wallets::Column::Balance).sub(total),
            )
            .col_expr(
                wallets::Column::LedgerBalance,
                Expr::col(wallets::Column::LedgerBalance).sub(total),
            )
            .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(wallets::Column::Id.eq(wallet_id))
            .filter(wallets::Column::OrganizationId.eq(organization_id))
            .filter(wallets::Column::Balance.gte(total))
            .exec(txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            // Lost the conditional update: distinguish a missing wallet
            // from an insufficient balance.
            let wallet = wallets::Entity::find_by_id(wallet_id)
                .filter(wallets::Column::OrganizationId.eq(organization_id))
                .one(txn)
                .await
                .map_err(db_err)?
                .ok_or(LedgerError::WalletNotFound(wallet_id))?;
            return Err(LedgerError::InsufficientFunds {
                available: wallet.balance,
                requested: total,
            });
        }

        wallets::Entity::find_by_id(wallet_id)
            .one(txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::WalletNotFound(wallet_id))
    }

    /// Rejects a same-user, same-amount debit inside the rolling window.
    async fn check_duplicate_window(&self, input: &ReserveFundsInput) -> Result<(), LedgerError> {
        let Some(created_by) = input.created_by else {
            return Ok(());
        };

        let window_start = Utc::now()
            - Duration::seconds(i64::try_from(input.duplicate_window_secs).unwrap_or(60));

        let duplicate = wallet_entries::Entity::find()
            .filter(wallet_entries::Column::OrganizationId.eq(input.organization_id))
            .filter(wallet_entries::Column::CreatedBy.eq(created_by))
            .filter(wallet_entries::Column::Amount.eq(input.amount))
            .filter(wallet_entries::Column::EntryType.eq(EntryType::Debit))
            .filter(
                wallet_entries::Column::Status
                    .is_in([EntryStatus::Pending, EntryStatus::Successful]),
            )
            .filter(wallet_entries::Column::CreatedAt.gte(window_start))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        if duplicate.is_some() {
            return Err(LedgerError::DuplicateTransferAttempt);
        }
        Ok(())
    }

    /// Stores the provider-assigned transfer ID on a pending entry.
    pub async fn set_provider_ref(
        &self,
        entry_id: Uuid,
        provider_ref: &str,
    ) -> Result<(), LedgerError> {
        wallet_entries::Entity::update_many()
            .col_expr(
                wallet_entries::Column::ProviderRef,
                Expr::value(provider_ref),
            )
            .col_expr(wallet_entries::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(wallet_entries::Column::Id.eq(entry_id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Finds an entry by its idempotency reference.
    pub async fn find_entry_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<wallet_entries::Model>, LedgerError> {
        wallet_entries::Entity::find()
            .filter(wallet_entries::Column::Reference.eq(reference))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Pending entries with a provider ref older than `cutoff`, for requery.
    pub async fn find_requeryable(
        &self,
        cutoff: chrono::DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<wallet_entries::Model>, LedgerError> {
        wallet_entries::Entity::find()
            .filter(wallet_entries::Column::Status.eq(EntryStatus::Pending))
            .filter(wallet_entries::Column::ProviderRef.is_not_null())
            .filter(wallet_entries::Column::CreatedAt.lt(cutoff))
            .order_by_asc(wallet_entries::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Paginated wallet statement.
    pub async fn list_entries(
        &self,
        organization_id: Uuid,
        wallet_id: Uuid,
        filter: EntryFilter,
        page: PageRequest,
    ) -> Result<PageResponse<wallet_entries::Model>, LedgerError> {
        let mut query = wallet_entries::Entity::find()
            .filter(wallet_entries::Column::OrganizationId.eq(organization_id))
            .filter(wallet_entries::Column::WalletId.eq(wallet_id));

        if let Some(status) = filter.status {
            query = query.filter(wallet_entries::Column::Status.eq(status));
        }
        if let Some(scope) = filter.scope {
            query = query.filter(wallet_entries::Column::Scope.eq(scope));
        }
        if let Some(from) = filter.from {
            query = query.filter(wallet_entries::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(wallet_entries::Column::CreatedAt.lte(to));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let data = query
            .order_by_desc(wallet_entries::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }
}

/// Conditional credit applied inside an existing transaction.
///
/// Returns the wallet as of after the credit.
pub(crate) async fn credit_wallet(
    txn: &DatabaseTransaction,
    wallet_id: Uuid,
    amount: i64,
) -> Result<wallets::Model, LedgerError> {
    let result = wallets::Entity::update_many()
        .col_expr(
            wallets::Column::Balance,
            Expr::col(wallets::Column::Balance).add(amount),
        )
        .col_expr(
            wallets::Column::LedgerBalance,
            Expr::col(wallets::Column::LedgerBalance).add(amount),
        )
        .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(wallets::Column::Id.eq(wallet_id))
        .exec(txn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        return Err(LedgerError::WalletNotFound(wallet_id));
    }

    wallets::Entity::find_by_id(wallet_id)
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(LedgerError::WalletNotFound(wallet_id))
}

/// Conditional budget spend applied inside an existing transaction.
///
/// Decrements `balance` and increments `amount_used` iff the budget is
/// active and the balance covers the total.
pub(crate) async fn debit_budget(
    txn: &DatabaseTransaction,
    budget_id: Uuid,
    total: i64,
) -> Result<(), LedgerError> {
    use crate::entities::sea_orm_active_enums::BudgetStatus;

    let result = budgets::Entity::update_many()
        .col_expr(
            budgets::Column::Balance,
            Expr::col(budgets::Column::Balance).sub(total),
        )
        .col_expr(
            budgets::Column::AmountUsed,
            Expr::col(budgets::Column::AmountUsed).add(total),
        )
        .col_expr(budgets::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(budgets::Column::Id.eq(budget_id))
        .filter(budgets::Column::Status.eq(BudgetStatus::Active))
        .filter(budgets::Column::Balance.gte(total))
        .exec(txn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        let budget = budgets::Entity::find_by_id(budget_id)
            .one(txn)
            .await
            .map_err(db_err)?;
        let available = budget.map_or(0, |b| b.balance);
        return Err(LedgerError::InsufficientFunds {
            available,
            requested: total,
        });
    }
    Ok(())
}

/// Credit back into a budget inside an existing transaction.
pub(crate) async fn credit_budget(
    txn: &DatabaseTransaction,
    budget_id: Uuid,
    amount: i64,
) -> Result<(), LedgerError> {
    budgets::Entity::update_many()
        .col_expr(
            budgets::Column::Balance,
            Expr::col(budgets::Column::Balance).add(amount),
        )
        .col_expr(
            budgets::Column::AmountUsed,
            Expr::col(budgets::Column::AmountUsed).sub(amount),
        )
        .col_expr(budgets::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(budgets::Column::Id.eq(budget_id))
        .exec(txn)
        .await
        .map_err(db_err)?;
    Ok(())
}

/// Maps a database error into the ledger taxonomy.
pub(crate) fn db_err(e: DbErr) -> LedgerError {
    LedgerError::Database(e.to_string())
}
