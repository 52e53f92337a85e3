//! Ledger domain types: operation inputs, outcomes, and the small enums the
//! engine and the storage layer share.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{
    AccountId, BudgetId, CategoryId, ContributionId, DebtId, ExpenseId, GoalId, OwnerId,
    RepaymentId, RevenueId, TransferId,
};

use super::error::EntityRef;

/// Whether a debit must be covered by the current balance.
///
/// Every balance decrease in the engine goes through one primitive that takes
/// this flag, so the choice is explicit at each call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundsCheck {
    /// Fail with `InsufficientFunds` if the balance is below the amount.
    Required,
    /// Apply the debit even if the balance goes negative.
    Unchecked,
}

/// Transfer record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Account funds moved into a goal.
    AccountToGoal,
    /// Goal funds moved back to an account.
    GoalToAccount,
    /// Funds moved between two accounts.
    AccountToAccount,
}

/// Source and destination of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferRoute {
    /// Account → goal.
    AccountToGoal {
        /// Debited account.
        from: AccountId,
        /// Credited goal.
        to: GoalId,
    },
    /// Goal → account.
    GoalToAccount {
        /// Debited goal.
        from: GoalId,
        /// Credited account.
        to: AccountId,
    },
    /// Account → account.
    AccountToAccount {
        /// Debited account.
        from: AccountId,
        /// Credited account.
        to: AccountId,
    },
}

impl TransferRoute {
    /// Returns the record type for this route.
    #[must_use]
    pub fn kind(&self) -> TransferKind {
        match self {
            Self::AccountToGoal { .. } => TransferKind::AccountToGoal,
            Self::GoalToAccount { .. } => TransferKind::GoalToAccount,
            Self::AccountToAccount { .. } => TransferKind::AccountToAccount,
        }
    }

    /// The entity being debited.
    #[must_use]
    pub fn source(&self) -> EntityRef {
        match *self {
            Self::AccountToGoal { from, .. } | Self::AccountToAccount { from, .. } => {
                EntityRef::Account(from)
            }
            Self::GoalToAccount { from, .. } => EntityRef::Goal(from),
        }
    }

    /// The entity being credited.
    #[must_use]
    pub fn destination(&self) -> EntityRef {
        match *self {
            Self::AccountToGoal { to, .. } => EntityRef::Goal(to),
            Self::GoalToAccount { to, .. } | Self::AccountToAccount { to, .. } => {
                EntityRef::Account(to)
            }
        }
    }
}

/// Who owes whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtDirection {
    /// The owner borrowed; repayments leave the owner's account.
    OwedByMe,
    /// The owner lent; repayments arrive in the owner's account.
    OwedToMe,
}

/// Direction money moves through a funding account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountFlow {
    /// Account is debited.
    Outflow,
    /// Account is credited.
    Inflow,
}

impl DebtDirection {
    /// How a repayment moves money through the owner's account.
    #[must_use]
    pub fn account_flow(self) -> AccountFlow {
        match self {
            Self::OwedByMe => AccountFlow::Outflow,
            Self::OwedToMe => AccountFlow::Inflow,
        }
    }
}

/// Debt lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtStatus {
    /// Still being repaid.
    Active,
    /// Fully repaid.
    Completed,
    /// Past its due date and not fully repaid.
    Overdue,
}

// ============================================================================
// Inputs
// ============================================================================

/// Input for recording an expense.
#[derive(Debug, Clone)]
pub struct AddExpenseInput {
    /// Owner of every entity involved.
    pub owner_id: OwnerId,
    /// Amount spent, strictly positive.
    pub amount: Decimal,
    /// Date the expense occurred; selects the budget month.
    pub date: NaiveDate,
    /// Spending category; selects the budget.
    pub category_id: CategoryId,
    /// Account charged first.
    pub account_id: AccountId,
    /// Free-text description.
    pub description: String,
    /// Goal that covers whatever the account cannot.
    pub goal_fallback_id: Option<GoalId>,
}

/// Input for a transfer.
#[derive(Debug, Clone)]
pub struct TransferInput {
    /// Owner of both endpoints.
    pub owner_id: OwnerId,
    /// Source and destination.
    pub route: TransferRoute,
    /// Amount moved, strictly positive.
    pub amount: Decimal,
}

/// Input for a debt repayment.
#[derive(Debug, Clone)]
pub struct RepayDebtInput {
    /// Owner of the debt.
    pub owner_id: OwnerId,
    /// Debt being repaid.
    pub debt_id: DebtId,
    /// Amount paid, strictly positive.
    pub amount: Decimal,
    /// Date of payment.
    pub paid_on: NaiveDate,
    /// Account the money moves through, if any.
    pub account_id: Option<AccountId>,
}

/// Input for a goal contribution.
#[derive(Debug, Clone)]
pub struct ContributeInput {
    /// Owner of the goal.
    pub owner_id: OwnerId,
    /// Goal being funded.
    pub goal_id: GoalId,
    /// Amount contributed, strictly positive.
    pub amount: Decimal,
    /// Account that funds the contribution, if any.
    pub account_id: Option<AccountId>,
}

/// Input for recording income.
#[derive(Debug, Clone)]
pub struct AddRevenueInput {
    /// Owner of the account.
    pub owner_id: OwnerId,
    /// Amount received, strictly positive.
    pub amount: Decimal,
    /// Date received.
    pub date: NaiveDate,
    /// Account credited.
    pub account_id: AccountId,
    /// Free-text description.
    pub description: String,
}

// ============================================================================
// Outcomes
// ============================================================================

/// Budget state after an expense touched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetSnapshot {
    /// Matched budget.
    pub budget_id: BudgetId,
    /// Remaining amount after the adjustment.
    pub remaining: Decimal,
}

/// Result of `add_expense`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseOutcome {
    /// New expense record.
    pub expense_id: ExpenseId,
    /// Account balance after the debit.
    pub account_balance: Decimal,
    /// Amount taken from the fallback goal (zero when none was needed).
    pub goal_drawdown: Decimal,
    /// Budget that was adjusted, `None` if no budget matched.
    pub budget: Option<BudgetSnapshot>,
}

/// Result of `transfer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    /// New transfer record.
    pub transfer_id: TransferId,
    /// Source balance after the debit.
    pub source_balance: Decimal,
    /// Destination balance after the credit.
    pub destination_balance: Decimal,
}

/// Result of `repay_debt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepaymentOutcome {
    /// New repayment record.
    pub repayment_id: RepaymentId,
    /// Repayment tally after this payment.
    pub remaining: Decimal,
    /// Debt status after this payment.
    pub status: DebtStatus,
    /// Funding account balance after the transfer, if an account was used.
    pub account_balance: Option<Decimal>,
}

/// Result of `contribute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionOutcome {
    /// New contribution record.
    pub contribution_id: ContributionId,
    /// Goal progress after the contribution.
    pub goal_current: Decimal,
    /// Funding account balance after the debit, if an account was used.
    pub account_balance: Option<Decimal>,
}

/// Result of `add_revenue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueOutcome {
    /// New revenue record.
    pub revenue_id: RevenueId,
    /// Account balance after the credit.
    pub account_balance: Decimal,
}
