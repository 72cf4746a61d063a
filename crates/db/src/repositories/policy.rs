//! Transfer policy repository.
//!
//! Loads an organization's policies, prefetches the rolling-window spend
//! sums the spend-limit policies need, and hands both to the pure policy
//! engine.

use std::collections::HashMap;

use chrono::{Datelike, Duration, Utc, Weekday};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use velora_core::policy::{
    PolicyDecision, PolicyEngine, PolicyError, PolicyKind, PolicyScope, PolicyWindow,
    TransferContext, TransferPolicy,
};
use velora_shared::types::{BudgetId, OrganizationId, TransferPolicyId};

use crate::entities::{
    transfer_policies, wallet_entries,
    sea_orm_active_enums::{
        EntryStatus, EntryType, PolicyKind as DbPolicyKind, PolicyWindow as DbPolicyWindow,
    },
};

/// Transfer policy repository.
#[derive(Debug, Clone)]
pub struct PolicyRepository {
    db: DatabaseConnection,
}

impl PolicyRepository {
    /// Creates a new policy repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads an organization's transfer policies as core domain values.
    ///
    /// Rows that fail to map (malformed weekday JSON, missing spend-limit
    /// fields) are skipped; the CHECK constraints make these unreachable
    /// for well-formed data.
    pub async fn list(&self, organization_id: Uuid) -> Result<Vec<TransferPolicy>, PolicyError> {
        let rows = transfer_policies::Entity::find()
            .filter(transfer_policies::Column::OrganizationId.eq(organization_id))
            .all(&self.db)
            .await
            .map_err(policy_db_err)?;

        Ok(rows.iter().filter_map(to_core_policy).collect())
    }

    /// Evaluates every matching policy against a transfer.
    ///
    /// Spend sums are prefetched per window before the pure engine runs.
    pub async fn check_transfer_policy(
        &self,
        organization_id: Uuid,
        ctx: &TransferContext,
    ) -> Result<PolicyDecision, PolicyError> {
        let policies = self.list(organization_id).await?;

        // Prefetch the sums the engine's closure will ask for.
        let mut sums: HashMap<PolicyWindow, i64> = HashMap::new();
        for policy in policies.iter().filter(|p| p.scope.matches(ctx)) {
            if let PolicyKind::SpendLimit { window, .. } = &policy.kind {
                if !sums.contains_key(window) {
                    let sum = self.spend_sum(ctx, *window).await?;
                    sums.insert(*window, sum);
                }
            }
        }

        Ok(PolicyEngine::check_transfer_policy(&policies, ctx, |q| {
            sums.get(&q.window).copied().unwrap_or(0)
        }))
    }

    /// Sums the user's successful+pending debit amounts over a rolling
    /// window, optionally scoped to the budget being spent from.
    async fn spend_sum(
        &self,
        ctx: &TransferContext,
        window: PolicyWindow,
    ) -> Result<i64, PolicyError> {
        let since = Utc::now() - Duration::days(window.days());

        let mut query = wallet_entries::Entity::find()
            .filter(wallet_entries::Column::CreatedBy.eq(ctx.user_id.into_inner()))
            .filter(wallet_entries::Column::EntryType.eq(EntryType::Debit))
            .filter(
                wallet_entries::Column::Status
                    .is_in([EntryStatus::Pending, EntryStatus::Successful]),
            )
            .filter(wallet_entries::Column::CreatedAt.gte(since));

        if let Some(budget_id) = ctx.budget_id {
            query =
                query.filter(wallet_entries::Column::BudgetId.eq(budget_id.into_inner()));
        }

        let entries = query.all(&self.db).await.map_err(policy_db_err)?;
        Ok(entries.iter().map(|e| e.amount).sum())
    }
}

/// Maps a policy row into the core domain type.
fn to_core_policy(row: &transfer_policies::Model) -> Option<TransferPolicy> {
    let kind = match row.kind {
        DbPolicyKind::Calendar => PolicyKind::Calendar {
            days_of_week: parse_weekdays(row.days_of_week.as_ref()?)?,
        },
        DbPolicyKind::SpendLimit => PolicyKind::SpendLimit {
            window: to_core_window(row.time_window.as_ref()?),
            amount: row.amount?,
        },
        DbPolicyKind::Invoice => PolicyKind::Invoice,
    };

    Some(TransferPolicy {
        id: TransferPolicyId::from_uuid(row.id),
        organization_id: OrganizationId::from_uuid(row.organization_id),
        kind,
        scope: PolicyScope {
            department: row.department.clone(),
            budget_id: row.budget_id.map(BudgetId::from_uuid),
            recipient_bank_code: row.recipient_bank_code.clone(),
            recipient_account_number: row.recipient_account_number.clone(),
        },
    })
}

/// Parses ISO weekday numbers (Mon=1..Sun=7) from the JSON column.
pub(crate) fn parse_weekdays(json: &serde_json::Value) -> Option<Vec<Weekday>> {
    let numbers = json.as_array()?;
    let mut days = Vec::with_capacity(numbers.len());
    for n in numbers {
        let n = n.as_u64()?;
        days.push(match n {
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            7 => Weekday::Sun,
            _ => return None,
        });
    }
    Some(days)
}

/// Encodes weekdays as ISO numbers for the JSON column.
#[must_use]
pub fn weekdays_to_json(days: &[Weekday]) -> serde_json::Value {
    serde_json::Value::Array(
        days.iter()
            .map(|d| serde_json::Value::from(d.number_from_monday()))
            .collect(),
    )
}

fn to_core_window(window: &DbPolicyWindow) -> PolicyWindow {
    match window {
        DbPolicyWindow::Daily => PolicyWindow::Daily,
        DbPolicyWindow::Weekly => PolicyWindow::Weekly,
        DbPolicyWindow::Monthly => PolicyWindow::Monthly,
    }
}

fn policy_db_err(e: DbErr) -> PolicyError {
    PolicyError::Database(e.to_string())
}

/// The weekday of the current UTC instant, for calendar policies.
#[must_use]
pub fn today_weekday() -> Weekday {
    Utc::now().weekday()
}
