//! Integration tests for expense add and delete.

mod common;

use common::{date, fixture};
use rust_decimal_macros::dec;
use tally_core::ledger::{
    AddExpenseInput, EntityRef, LedgerError, ThresholdDomain,
};
use tally_shared::types::{AccountId, CategoryId, ExpenseId, GoalId, OwnerId};

fn expense(
    owner_id: OwnerId,
    account_id: AccountId,
    category_id: CategoryId,
    amount: rust_decimal::Decimal,
    goal_fallback_id: Option<GoalId>,
) -> AddExpenseInput {
    AddExpenseInput {
        owner_id,
        amount,
        date: date(2026, 3, 14),
        category_id,
        account_id,
        description: "Groceries".to_string(),
        goal_fallback_id,
    }
}

#[tokio::test]
async fn test_goal_covers_shortfall_and_budget_goes_negative() {
    let Some(fx) = fixture().await else { return };

    let account = fx.account(dec!(100)).await;
    let goal = fx.goal(dec!(500), dec!(80)).await;
    let category = fx.category("Food").await;
    let budget = fx.budget(category, "2026-03", dec!(0)).await;

    let outcome = fx
        .engine
        .add_expense(expense(fx.owner, account, category, dec!(150), Some(goal)))
        .await
        .unwrap();

    assert_eq!(outcome.account_balance, dec!(0));
    assert_eq!(outcome.goal_drawdown, dec!(50));
    let snapshot = outcome.budget.expect("budget matched");
    assert_eq!(snapshot.budget_id, budget);
    assert_eq!(snapshot.remaining, dec!(-150));

    assert_eq!(fx.account_balance(account).await, dec!(0));
    assert_eq!(fx.goal_current(goal).await, dec!(30));
    assert_eq!(fx.budget_remaining(budget).await, dec!(-150));

    let row = fx.expense_row(outcome.expense_id).await.expect("expense stored");
    assert_eq!(row.amount, dec!(150));
    assert_eq!(row.goal_id, Some(goal.0));
    assert_eq!(row.goal_drawdown, dec!(50));
    assert_eq!(row.budget_id, Some(budget.0));

    fx.cleanup().await;
}

#[tokio::test]
async fn test_goal_too_small_rolls_back_everything() {
    let Some(fx) = fixture().await else { return };

    let account = fx.account(dec!(100)).await;
    let goal = fx.goal(dec!(500), dec!(30)).await;
    let category = fx.category("Food").await;
    let budget = fx.budget(category, "2026-03", dec!(200)).await;

    let err = fx
        .engine
        .add_expense(expense(fx.owner, account, category, dec!(150), Some(goal)))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LedgerError::InsufficientFunds {
            entity: EntityRef::Goal(goal),
            required: dec!(50),
            available: dec!(30),
        }
    );
    assert_eq!(fx.account_balance(account).await, dec!(100));
    assert_eq!(fx.goal_current(goal).await, dec!(30));
    assert_eq!(fx.budget_remaining(budget).await, dec!(200));
    assert_eq!(fx.expense_count().await, 0);
    assert!(fx.sink.events().is_empty());

    fx.cleanup().await;
}

#[tokio::test]
async fn test_shortfall_without_goal_rejected() {
    let Some(fx) = fixture().await else { return };

    let account = fx.account(dec!(20)).await;
    let category = fx.category("Food").await;

    let err = fx
        .engine
        .add_expense(expense(fx.owner, account, category, dec!(80), None))
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    assert_eq!(fx.account_balance(account).await, dec!(20));
    assert_eq!(fx.expense_count().await, 0);

    fx.cleanup().await;
}

#[tokio::test]
async fn test_no_budget_is_not_an_error() {
    let Some(fx) = fixture().await else { return };

    let account = fx.account(dec!(100)).await;
    let category = fx.category("Travel").await;
    // Budget for a different month must not match.
    fx.budget(category, "2026-04", dec!(300)).await;

    let outcome = fx
        .engine
        .add_expense(expense(fx.owner, account, category, dec!(40), None))
        .await
        .unwrap();

    assert!(outcome.budget.is_none());
    assert_eq!(outcome.goal_drawdown, dec!(0));
    assert_eq!(fx.account_balance(account).await, dec!(60));

    fx.cleanup().await;
}

#[tokio::test]
async fn test_delete_reverses_account_goal_and_budget() {
    let Some(fx) = fixture().await else { return };

    let account = fx.account(dec!(100)).await;
    let goal = fx.goal(dec!(500), dec!(80)).await;
    let category = fx.category("Food").await;
    let budget = fx.budget(category, "2026-03", dec!(400)).await;

    let outcome = fx
        .engine
        .add_expense(expense(fx.owner, account, category, dec!(150), Some(goal)))
        .await
        .unwrap();

    fx.engine
        .delete_expense(fx.owner, outcome.expense_id)
        .await
        .unwrap();

    assert_eq!(fx.account_balance(account).await, dec!(100));
    assert_eq!(fx.goal_current(goal).await, dec!(80));
    assert_eq!(fx.budget_remaining(budget).await, dec!(400));
    assert!(fx.expense_row(outcome.expense_id).await.is_none());

    fx.cleanup().await;
}

#[tokio::test]
async fn test_delete_other_owners_expense_is_not_found() {
    let Some(fx) = fixture().await else { return };

    let account = fx.account(dec!(100)).await;
    let category = fx.category("Food").await;
    let outcome = fx
        .engine
        .add_expense(expense(fx.owner, account, category, dec!(10), None))
        .await
        .unwrap();

    let err = fx
        .engine
        .delete_expense(OwnerId::new(), outcome.expense_id)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound(EntityRef::Expense(outcome.expense_id)));
    assert_eq!(fx.account_balance(account).await, dec!(90));

    let missing = ExpenseId::new();
    let err = fx.engine.delete_expense(fx.owner, missing).await.unwrap_err();
    assert_eq!(err, LedgerError::NotFound(EntityRef::Expense(missing)));

    fx.cleanup().await;
}

#[tokio::test]
async fn test_foreign_account_is_not_found() {
    let Some(fx) = fixture().await else { return };

    let account = fx.account(dec!(100)).await;
    let category = fx.category("Food").await;

    let err = fx
        .engine
        .add_expense(expense(OwnerId::new(), account, category, dec!(10), None))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound(EntityRef::Account(account)));

    fx.cleanup().await;
}

#[tokio::test]
async fn test_validation_happens_before_locking() {
    let Some(fx) = fixture().await else { return };

    let account = fx.account(dec!(100)).await;
    let category = fx.category("Food").await;

    let err = fx
        .engine
        .add_expense(expense(fx.owner, account, category, dec!(0), None))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(fx.expense_count().await, 0);

    fx.cleanup().await;
}

#[tokio::test]
async fn test_events_published_after_commit() {
    let Some(fx) = fixture().await else { return };

    let account = fx.account(dec!(100)).await;
    let category = fx.category("Food").await;
    let budget = fx.budget(category, "2026-03", dec!(50)).await;

    fx.engine
        .add_expense(expense(fx.owner, account, category, dec!(70), None))
        .await
        .unwrap();

    let events = fx.sink.events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.owner_id == fx.owner));
    assert!(events.iter().any(|e| e.domain == ThresholdDomain::AccountBalance
        && e.entity_id == account.0
        && e.current_value == dec!(30)));
    assert!(events.iter().any(|e| e.domain == ThresholdDomain::BudgetRemaining
        && e.entity_id == budget.0
        && e.current_value == dec!(-20)));

    fx.cleanup().await;
}
