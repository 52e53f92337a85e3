//! Ledger rules shared by every multi-entity money operation.
//!
//! This module holds everything about an operation that can be decided
//! without touching storage:
//! - Error types and entity references
//! - Operation inputs and outcomes
//! - Input validation
//! - The global lock order
//! - Balance arithmetic and the per-operation plans built on it
//! - Threshold events and the sink boundary

pub mod balance;
pub mod debt;
pub mod error;
pub mod events;
pub mod expense;
pub mod goal;
pub mod lock_plan;
pub mod policy;
pub mod types;
pub mod validation;

#[cfg(test)]
mod expense_props;
#[cfg(test)]
mod lock_plan_props;

pub use error::{EntityRef, LedgerError};
pub use events::{NoopThresholdSink, PendingEvents, ThresholdDomain, ThresholdEvent, ThresholdSink};
pub use expense::{ExpensePlan, ExpenseReversal, GoalFallback, budget_month, plan_expense, plan_reversal};
pub use lock_plan::{LockPlan, LockSequence, LockTarget};
pub use policy::LedgerPolicy;
pub use types::{
    AccountFlow, AddExpenseInput, AddRevenueInput, BudgetSnapshot, ContributeInput,
    ContributionOutcome, DebtDirection, DebtStatus, ExpenseOutcome, FundsCheck, RepayDebtInput,
    RepaymentOutcome, RevenueOutcome, TransferInput, TransferKind, TransferOutcome, TransferRoute,
};
