//! Expense add and delete.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect, Set,
};
use tally_core::ledger::{
    AddExpenseInput, BudgetSnapshot, EntityRef, ExpenseOutcome, FundsCheck, GoalFallback,
    LedgerError, LockPlan, PendingEvents, ThresholdDomain, balance, budget_month, plan_expense,
    plan_reversal,
};
use tally_shared::types::{
    AccountId, BudgetId, CategoryId, ExpenseId, GoalId, OwnerId,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::LedgerEngine;
use super::balance::BalanceMutator;
use super::locking::RowLocker;
use super::storage::{StorageResultExt, log_failure};
use crate::entities::{budgets, expenses};

impl LedgerEngine {
    /// Records an expense.
    ///
    /// The account pays as much as it holds; the fallback goal covers the
    /// rest. The month's budget for the category, if one exists, is reduced
    /// by the full amount.
    ///
    /// # Errors
    ///
    /// - `Validation` for a non-positive amount or empty description
    /// - `NotFound` if the account or goal does not exist for this owner
    /// - `InsufficientFunds` if account and goal together cannot cover it
    /// - `LockTimeout` / `StorageFailure`
    #[instrument(
        skip(self, input),
        fields(owner_id = %input.owner_id, account_id = %input.account_id, amount = %input.amount)
    )]
    pub async fn add_expense(&self, input: AddExpenseInput) -> Result<ExpenseOutcome, LedgerError> {
        self.add_expense_in_txn(input)
            .await
            .inspect_err(|err| log_failure("add_expense", err))
    }

    async fn add_expense_in_txn(&self, input: AddExpenseInput) -> Result<ExpenseOutcome, LedgerError> {
        input.validate()?;

        let txn = self.begin().await?;
        let mut locker = RowLocker::new(&txn, Some(input.owner_id));
        let rows = locker
            .acquire(
                &LockPlan::new()
                    .with(input.account_id)
                    .with_optional(input.goal_fallback_id),
            )
            .await?;

        let account = rows.account(input.account_id)?;
        let goal = input
            .goal_fallback_id
            .map(|goal_id| {
                rows.goal(goal_id).map(|goal| GoalFallback {
                    goal_id,
                    current: goal.current_amount,
                })
            })
            .transpose()?;

        let plan = plan_expense(input.account_id, account.balance, input.amount, goal)?;

        let mutator = BalanceMutator::new(&txn);
        let mut events = PendingEvents::for_owner(input.owner_id);

        mutator
            .write_account(input.account_id, plan.account_balance)
            .await?;
        events.push(
            ThresholdDomain::AccountBalance,
            input.account_id,
            plan.account_balance,
        );

        let drawn_goal = match (input.goal_fallback_id, plan.goal_current) {
            (Some(goal_id), Some(current)) if !plan.goal_drawdown.is_zero() => {
                mutator.write_goal(goal_id, current).await?;
                events.push(ThresholdDomain::GoalProgress, goal_id, current);
                Some(goal_id)
            }
            _ => None,
        };

        // Budget ranks last in the lock order, so locking it now keeps order.
        let month = budget_month(input.date);
        let budget = match find_budget(&txn, input.owner_id, input.category_id, &month).await? {
            Some(budget_id) => {
                let rows = locker.acquire(&LockPlan::new().with(budget_id)).await?;
                let row = rows.budget(budget_id)?;
                let remaining = balance::debit(
                    EntityRef::Budget(budget_id),
                    row.remaining_amount,
                    input.amount,
                    FundsCheck::Unchecked,
                )?;
                mutator.write_budget(budget_id, remaining).await?;
                events.push(ThresholdDomain::BudgetRemaining, budget_id, remaining);
                Some(BudgetSnapshot {
                    budget_id,
                    remaining,
                })
            }
            None => None,
        };

        let expense_id = ExpenseId::new();
        expenses::ActiveModel {
            id: Set(expense_id.0),
            owner_id: Set(input.owner_id.0),
            amount: Set(input.amount),
            expense_date: Set(input.date),
            category_id: Set(input.category_id.0),
            account_id: Set(input.account_id.0),
            goal_id: Set(drawn_goal.map(GoalId::into_inner)),
            goal_drawdown: Set(plan.goal_drawdown),
            budget_id: Set(budget.map(|b| b.budget_id.0)),
            subscription_id: Set(None),
            description: Set(input.description.clone()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .storage()?;

        self.commit(txn, events).await?;

        info!(
            %expense_id,
            from_account = %plan.from_account,
            goal_drawdown = %plan.goal_drawdown,
            budget_matched = budget.is_some(),
            "expense recorded"
        );

        Ok(ExpenseOutcome {
            expense_id,
            account_balance: plan.account_balance,
            goal_drawdown: plan.goal_drawdown,
            budget,
        })
    }

    /// Deletes an expense and reverses every balance it changed: the account
    /// gets back what it paid, the goal its drawdown, the budget the full
    /// amount.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the expense does not exist for this owner
    /// - `LockTimeout` / `StorageFailure`
    #[instrument(skip(self), fields(owner_id = %owner_id, expense_id = %expense_id))]
    pub async fn delete_expense(
        &self,
        owner_id: OwnerId,
        expense_id: ExpenseId,
    ) -> Result<(), LedgerError> {
        self.delete_expense_in_txn(owner_id, expense_id)
            .await
            .inspect_err(|err| log_failure("delete_expense", err))
    }

    async fn delete_expense_in_txn(
        &self,
        owner_id: OwnerId,
        expense_id: ExpenseId,
    ) -> Result<(), LedgerError> {
        let txn = self.begin().await?;
        let mut locker = RowLocker::new(&txn, Some(owner_id));

        let rows = locker.acquire(&LockPlan::new().with(expense_id)).await?;
        let expense = rows.expense(expense_id)?.clone();

        let account_id = AccountId::from_uuid(expense.account_id);
        let goal_id = expense
            .goal_id
            .filter(|_| expense.goal_drawdown > Decimal::ZERO)
            .map(GoalId::from_uuid);
        let budget_id = expense.budget_id.map(BudgetId::from_uuid);

        let rows = locker
            .acquire(
                &LockPlan::new()
                    .with(account_id)
                    .with_optional(goal_id)
                    .with_optional(budget_id),
            )
            .await?;

        let reversal = plan_reversal(expense.amount, expense.goal_drawdown);
        let mutator = BalanceMutator::new(&txn);
        let mut events = PendingEvents::for_owner(owner_id);

        let account_balance = balance::credit(rows.account(account_id)?.balance, reversal.account_credit);
        mutator.write_account(account_id, account_balance).await?;
        events.push(ThresholdDomain::AccountBalance, account_id, account_balance);

        if let Some(goal_id) = goal_id {
            let current = balance::credit(rows.goal(goal_id)?.current_amount, reversal.goal_credit);
            mutator.write_goal(goal_id, current).await?;
            events.push(ThresholdDomain::GoalProgress, goal_id, current);
        }

        if let Some(budget_id) = budget_id {
            let remaining =
                balance::credit(rows.budget(budget_id)?.remaining_amount, reversal.budget_credit);
            mutator.write_budget(budget_id, remaining).await?;
            events.push(ThresholdDomain::BudgetRemaining, budget_id, remaining);
        }

        expenses::Entity::delete_by_id(expense_id.0)
            .exec(&txn)
            .await
            .storage()?;

        self.commit(txn, events).await?;

        info!(
            amount = %expense.amount,
            account_credit = %reversal.account_credit,
            goal_credit = %reversal.goal_credit,
            "expense reversed"
        );
        Ok(())
    }
}

/// Finds the budget for (owner, category, month) without locking it.
async fn find_budget(
    txn: &DatabaseTransaction,
    owner_id: OwnerId,
    category_id: CategoryId,
    month: &str,
) -> Result<Option<BudgetId>, LedgerError> {
    let id: Option<Uuid> = budgets::Entity::find()
        .select_only()
        .column(budgets::Column::Id)
        .filter(budgets::Column::OwnerId.eq(owner_id.0))
        .filter(budgets::Column::CategoryId.eq(category_id.0))
        .filter(budgets::Column::Month.eq(month))
        .into_tuple()
        .one(txn)
        .await
        .storage()?;
    Ok(id.map(BudgetId::from_uuid))
}
