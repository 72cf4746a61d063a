//! `SeaORM` Entity for the budgets table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::BudgetStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub wallet_id: Uuid,
    pub project_id: Option<Uuid>,
    pub name: String,
    pub currency: String,
    /// Approved ceiling in minor units.
    pub amount: i64,
    /// Spendable remainder in minor units. Never negative, never above amount.
    pub balance: i64,
    /// Total spent so far in minor units.
    pub amount_used: i64,
    pub status: BudgetStatus,
    /// Low-balance notification threshold in minor units.
    pub threshold: Option<i64>,
    pub created_by: Uuid,
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
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Projects,
    #[sea_orm(has_many = "super::budget_beneficiaries::Entity")]
    BudgetBeneficiaries,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::budget_beneficiaries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetBeneficiaries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
