//! `SeaORM` Entity for the transfer_policies table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PolicyKind, PolicyWindow};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transfer_policies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub kind: PolicyKind,
    /// Blocked weekdays (calendar policies), ISO numbers Mon=1..Sun=7.
    pub days_of_week: Option<Json>,
    /// Rolling window (spend-limit policies).
    pub time_window: Option<PolicyWindow>,
    /// Spend ceiling in minor units (spend-limit policies).
    pub amount: Option<i64>,
    /// Department scope, when set.
    pub department: Option<String>,
    /// Budget scope, when set.
    pub budget_id: Option<Uuid>,
    /// Recipient bank-code scope, when set.
    pub recipient_bank_code: Option<String>,
    /// Recipient account-number scope, when set.
    pub recipient_account_number: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id"
    )]
    Organizations,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
