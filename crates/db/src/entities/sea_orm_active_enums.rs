//! `SeaORM` active enums for `PostgreSQL` enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::ledger::types;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "debt_direction")]
pub enum DebtDirection {
    #[sea_orm(string_value = "owed_by_me")]
    OwedByMe,
    #[sea_orm(string_value = "owed_to_me")]
    OwedToMe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "debt_status")]
pub enum DebtStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "overdue")]
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transfer_type")]
pub enum TransferType {
    #[sea_orm(string_value = "account_to_goal")]
    AccountToGoal,
    #[sea_orm(string_value = "goal_to_account")]
    GoalToAccount,
    #[sea_orm(string_value = "account_to_account")]
    AccountToAccount,
}

impl From<DebtDirection> for types::DebtDirection {
    fn from(value: DebtDirection) -> Self {
        match value {
            DebtDirection::OwedByMe => Self::OwedByMe,
            DebtDirection::OwedToMe => Self::OwedToMe,
        }
    }
}

impl From<DebtStatus> for types::DebtStatus {
    fn from(value: DebtStatus) -> Self {
        match value {
            DebtStatus::Active => Self::Active,
            DebtStatus::Completed => Self::Completed,
            DebtStatus::Overdue => Self::Overdue,
        }
    }
}

impl From<types::DebtStatus> for DebtStatus {
    fn from(value: types::DebtStatus) -> Self {
        match value {
            types::DebtStatus::Active => Self::Active,
            types::DebtStatus::Completed => Self::Completed,
            types::DebtStatus::Overdue => Self::Overdue,
        }
    }
}

impl From<types::TransferKind> for TransferType {
    fn from(value: types::TransferKind) -> Self {
        match value {
            types::TransferKind::AccountToGoal => Self::AccountToGoal,
            types::TransferKind::GoalToAccount => Self::GoalToAccount,
            types::TransferKind::AccountToAccount => Self::AccountToAccount,
        }
    }
}
