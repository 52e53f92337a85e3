//! Expense planning: how an expense splits between its account and the
//! fallback goal, and how a deleted expense is reversed.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, GoalId};

use super::balance;
use super::error::{EntityRef, LedgerError};
use super::types::FundsCheck;

/// Budget month key (`YYYY-MM`) an expense dated `date` counts against.
#[must_use]
pub fn budget_month(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Current state of the fallback goal, read under lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalFallback {
    /// Goal id.
    pub goal_id: GoalId,
    /// Goal progress before the expense.
    pub current: Decimal,
}

/// How an expense is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpensePlan {
    /// Amount taken from the account.
    pub from_account: Decimal,
    /// Amount taken from the fallback goal.
    pub goal_drawdown: Decimal,
    /// Account balance after the debit.
    pub account_balance: Decimal,
    /// Goal progress after the drawdown, if a goal was supplied.
    pub goal_current: Option<Decimal>,
}

/// Splits `amount` between the account and the fallback goal.
///
/// The account pays as much as it holds (never below zero). Any shortfall
/// comes from the goal; without a goal, or with a goal that cannot cover it,
/// the expense is rejected.
pub fn plan_expense(
    account_id: AccountId,
    account_balance: Decimal,
    amount: Decimal,
    goal: Option<GoalFallback>,
) -> Result<ExpensePlan, LedgerError> {
    let from_account = account_balance.clamp(Decimal::ZERO, amount);
    let shortfall = amount - from_account;

    let account_after = balance::debit(
        EntityRef::Account(account_id),
        account_balance,
        from_account,
        FundsCheck::Unchecked,
    )?;

    if shortfall.is_zero() {
        return Ok(ExpensePlan {
            from_account,
            goal_drawdown: Decimal::ZERO,
            account_balance: account_after,
            goal_current: goal.map(|g| g.current),
        });
    }

    let Some(goal) = goal else {
        return Err(LedgerError::InsufficientFunds {
            entity: EntityRef::Account(account_id),
            required: amount,
            available: account_balance,
        });
    };

    let goal_after = balance::debit(
        EntityRef::Goal(goal.goal_id),
        goal.current,
        shortfall,
        FundsCheck::Required,
    )?;

    Ok(ExpensePlan {
        from_account,
        goal_drawdown: shortfall,
        account_balance: account_after,
        goal_current: Some(goal_after),
    })
}

/// Credits that undo a recorded expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpenseReversal {
    /// Returned to the account.
    pub account_credit: Decimal,
    /// Returned to the goal.
    pub goal_credit: Decimal,
    /// Returned to the budget's remaining amount.
    pub budget_credit: Decimal,
}

/// Computes the reversal of an expense of `amount` that drew `goal_drawdown`
/// from its goal.
#[must_use]
pub fn plan_reversal(amount: Decimal, goal_drawdown: Decimal) -> ExpenseReversal {
    ExpenseReversal {
        account_credit: amount - goal_drawdown,
        goal_credit: goal_drawdown,
        budget_credit: amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn account_id() -> AccountId {
        AccountId::from_uuid(Uuid::from_u128(1))
    }

    fn goal(current: Decimal) -> GoalFallback {
        GoalFallback {
            goal_id: GoalId::from_uuid(Uuid::from_u128(2)),
            current,
        }
    }

    #[test]
    fn test_budget_month_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert_eq!(budget_month(date), "2026-03");
    }

    #[test]
    fn test_account_covers_everything() {
        let plan = plan_expense(account_id(), dec!(100), dec!(40), None).unwrap();
        assert_eq!(plan.from_account, dec!(40));
        assert_eq!(plan.goal_drawdown, dec!(0));
        assert_eq!(plan.account_balance, dec!(60));
    }

    #[test]
    fn test_goal_covers_shortfall() {
        let plan = plan_expense(account_id(), dec!(100), dec!(150), Some(goal(dec!(80)))).unwrap();
        assert_eq!(plan.from_account, dec!(100));
        assert_eq!(plan.goal_drawdown, dec!(50));
        assert_eq!(plan.account_balance, dec!(0));
        assert_eq!(plan.goal_current, Some(dec!(30)));
    }

    #[test]
    fn test_negative_account_contributes_nothing() {
        let plan = plan_expense(account_id(), dec!(-20), dec!(10), Some(goal(dec!(50)))).unwrap();
        assert_eq!(plan.from_account, dec!(0));
        assert_eq!(plan.goal_drawdown, dec!(10));
        assert_eq!(plan.account_balance, dec!(-20));
    }

    #[test]
    fn test_shortfall_without_goal_rejected() {
        let err = plan_expense(account_id(), dec!(100), dec!(150), None).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                entity: EntityRef::Account(account_id()),
                required: dec!(150),
                available: dec!(100),
            }
        );
    }

    #[test]
    fn test_goal_cannot_cover_shortfall() {
        let err = plan_expense(account_id(), dec!(100), dec!(150), Some(goal(dec!(30)))).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                entity: EntityRef::Goal(goal(dec!(30)).goal_id),
                required: dec!(50),
                available: dec!(30),
            }
        );
    }

    #[test]
    fn test_reversal_splits_by_drawdown() {
        let reversal = plan_reversal(dec!(150), dec!(50));
        assert_eq!(reversal.account_credit, dec!(100));
        assert_eq!(reversal.goal_credit, dec!(50));
        assert_eq!(reversal.budget_credit, dec!(150));
    }
}
