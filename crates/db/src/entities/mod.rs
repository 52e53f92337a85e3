//! `SeaORM` entity definitions.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod contributions;
pub mod debts;
pub mod expenses;
pub mod goals;
pub mod repayments;
pub mod revenues;
pub mod sea_orm_active_enums;
pub mod subscriptions;
pub mod transfers;
