//! `SeaORM` Entity for debts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{DebtDirection, DebtStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "debts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub counterparty: String,
    pub direction: DebtDirection,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub principal: Decimal,
    /// Amount repaid so far; never exceeds `principal`.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub remaining: Decimal,
    pub status: DebtStatus,
    pub due_date: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::repayments::Entity")]
    Repayments,
}

impl Related<super::repayments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
