//! `SeaORM` Entity for the wallet_entries table.
//!
//! Append-mostly: rows are mutated at most once from Pending to a terminal
//! status, or stamped with a reversal marker and superseded by a new
//! compensating entry. Never edited retroactively otherwise.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EntryScope, EntryStatus, EntryType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "wallet_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub wallet_id: Uuid,
    pub budget_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub payroll_payout_id: Option<Uuid>,
    pub entry_type: EntryType,
    pub status: EntryStatus,
    pub scope: EntryScope,
    /// Amount in minor units, always positive.
    pub amount: i64,
    /// Fee in minor units, zero or positive.
    pub fee: i64,
    pub currency: String,
    pub balance_before: i64,
    pub balance_after: i64,
    pub ledger_balance_before: i64,
    pub ledger_balance_after: i64,
    /// Caller-chosen idempotency key, globally unique.
    #[sea_orm(unique)]
    pub reference: String,
    /// Provider-assigned transfer ID, once known.
    pub provider_ref: Option<String>,
    pub narration: Option<String>,
    /// Scope-specific payload (e.g. counterparty snapshot).
    pub meta: Json,
    /// Entry this one compensates, for reversal credits.
    pub reverses: Option<Uuid>,
    /// Stamped when a reversal of this entry has been processed.
    pub reversed_at: Option<DateTimeWithTimeZone>,
    pub settled_at: Option<DateTimeWithTimeZone>,
    pub gateway_response: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id"
    )]
    Wallets,
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id"
    )]
    Budgets,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
