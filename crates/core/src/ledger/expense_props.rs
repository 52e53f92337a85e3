//! Property-based tests for expense planning.
//!
//! - Money is conserved: account part plus goal part equals the amount
//! - The account never pays more than it held
//! - Reversal returns every part to where it came from

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, GoalId};

use super::error::LedgerError;
use super::expense::{GoalFallback, plan_expense, plan_reversal};

/// Strategy to generate positive amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate balances, including overdrawn ones.
fn balance() -> impl Strategy<Value = Decimal> {
    (-100_000i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Whatever succeeds splits the amount exactly.
    #[test]
    fn prop_split_conserves_amount(
        account_balance in balance(),
        goal_current in balance().prop_map(|b| b.abs()),
        amount in positive_amount(),
    ) {
        let goal = GoalFallback { goal_id: GoalId::new(), current: goal_current };
        if let Ok(plan) = plan_expense(AccountId::new(), account_balance, amount, Some(goal)) {
            prop_assert_eq!(plan.from_account + plan.goal_drawdown, amount);
            prop_assert_eq!(plan.account_balance, account_balance - plan.from_account);
            prop_assert_eq!(plan.goal_current, Some(goal_current - plan.goal_drawdown));
            prop_assert!(plan.goal_current.unwrap() >= Decimal::ZERO);
        }
    }

    /// The account is never pushed below zero by an expense, and an
    /// overdrawn account is left as it was.
    #[test]
    fn prop_account_never_overdrawn(
        account_balance in balance(),
        amount in positive_amount(),
    ) {
        let goal = GoalFallback { goal_id: GoalId::new(), current: amount };
        let plan = plan_expense(AccountId::new(), account_balance, amount, Some(goal)).unwrap();
        prop_assert!(plan.from_account >= Decimal::ZERO);
        prop_assert!(plan.account_balance >= account_balance.min(Decimal::ZERO));
    }

    /// Without a goal, an expense succeeds iff the account covers it.
    #[test]
    fn prop_no_goal_requires_full_balance(
        account_balance in balance(),
        amount in positive_amount(),
    ) {
        let result = plan_expense(AccountId::new(), account_balance, amount, None);
        if account_balance >= amount {
            prop_assert_eq!(result.unwrap().goal_drawdown, Decimal::ZERO);
        } else {
            let is_insufficient = matches!(result, Err(LedgerError::InsufficientFunds { .. }));
            prop_assert!(is_insufficient);
        }
    }

    /// Reversal restores both balances.
    #[test]
    fn prop_reversal_restores_balances(
        account_balance in balance(),
        amount in positive_amount(),
    ) {
        let goal_current = amount;
        let goal = GoalFallback { goal_id: GoalId::new(), current: goal_current };
        let plan = plan_expense(AccountId::new(), account_balance, amount, Some(goal)).unwrap();
        let reversal = plan_reversal(amount, plan.goal_drawdown);

        prop_assert_eq!(plan.account_balance + reversal.account_credit, account_balance);
        prop_assert_eq!(plan.goal_current.unwrap() + reversal.goal_credit, goal_current);
        prop_assert_eq!(reversal.budget_credit, amount);
    }
}
