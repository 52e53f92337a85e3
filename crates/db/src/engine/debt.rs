//! Debt repayment and the overdue sweep.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, sea_query::Expr,
};
use tally_core::ledger::{
    AccountFlow, DebtDirection, EntityRef, FundsCheck, LedgerError, LockPlan, PendingEvents,
    RepayDebtInput, RepaymentOutcome, ThresholdDomain, balance, debt::plan_repayment,
};
use tally_shared::types::RepaymentId;
use tracing::{info, instrument};

use super::LedgerEngine;
use super::balance::BalanceMutator;
use super::locking::RowLocker;
use super::storage::{StorageResultExt, log_failure};
use crate::entities::{debts, repayments, sea_orm_active_enums::DebtStatus};

impl LedgerEngine {
    /// Records a repayment against a debt.
    ///
    /// The repayment tally grows toward the principal and never past it. With
    /// a funding account, money leaves it for a debt the owner owes and
    /// arrives in it for a debt owed to the owner.
    ///
    /// # Errors
    ///
    /// - `Validation` for a non-positive amount
    /// - `NotFound` if the debt or account does not exist for this owner
    /// - `CapExceeded` if the payment would pass the principal
    /// - `InsufficientFunds` if the account cannot cover an outgoing payment
    /// - `LockTimeout` / `StorageFailure`
    #[instrument(
        skip(self, input),
        fields(owner_id = %input.owner_id, debt_id = %input.debt_id, amount = %input.amount)
    )]
    pub async fn repay_debt(&self, input: RepayDebtInput) -> Result<RepaymentOutcome, LedgerError> {
        self.repay_debt_in_txn(input)
            .await
            .inspect_err(|err| log_failure("repay_debt", err))
    }

    async fn repay_debt_in_txn(
        &self,
        input: RepayDebtInput,
    ) -> Result<RepaymentOutcome, LedgerError> {
        input.validate()?;

        let txn = self.begin().await?;
        let mut locker = RowLocker::new(&txn, Some(input.owner_id));
        let rows = locker
            .acquire(
                &LockPlan::new()
                    .with(input.debt_id)
                    .with_optional(input.account_id),
            )
            .await?;

        let debt = rows.debt(input.debt_id)?;
        let plan = plan_repayment(
            input.debt_id,
            debt.principal,
            debt.remaining,
            debt.status.into(),
            input.amount,
        )?;

        let account_balance = match input.account_id {
            Some(account_id) => {
                let current = rows.account(account_id)?.balance;
                let updated = match DebtDirection::from(debt.direction).account_flow() {
                    AccountFlow::Outflow => balance::debit(
                        EntityRef::Account(account_id),
                        current,
                        input.amount,
                        FundsCheck::Required,
                    )?,
                    AccountFlow::Inflow => balance::credit(current, input.amount),
                };
                Some((account_id, updated))
            }
            None => None,
        };

        let repayment_id = RepaymentId::new();
        repayments::ActiveModel {
            id: Set(repayment_id.0),
            owner_id: Set(input.owner_id.0),
            debt_id: Set(input.debt_id.0),
            account_id: Set(input.account_id.map(|id| id.0)),
            amount: Set(input.amount),
            paid_on: Set(input.paid_on),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .storage()?;

        let mutator = BalanceMutator::new(&txn);
        let mut events = PendingEvents::for_owner(input.owner_id);

        mutator
            .write_debt(input.debt_id, plan.remaining, plan.status.into())
            .await?;
        events.push(ThresholdDomain::DebtRepaid, input.debt_id, plan.remaining);

        if let Some((account_id, updated)) = account_balance {
            mutator.write_account(account_id, updated).await?;
            events.push(ThresholdDomain::AccountBalance, account_id, updated);
        }

        self.commit(txn, events).await?;

        info!(
            %repayment_id,
            remaining = %plan.remaining,
            status = ?plan.status,
            "repayment recorded"
        );

        Ok(RepaymentOutcome {
            repayment_id,
            remaining: plan.remaining,
            status: plan.status,
            account_balance: account_balance.map(|(_, updated)| updated),
        })
    }

    /// Marks active debts past their due date and not fully repaid as
    /// overdue. Returns the number of debts changed.
    ///
    /// # Errors
    ///
    /// `LockTimeout` if a debt stays locked by a repayment past the lock
    /// timeout, otherwise `StorageFailure`.
    #[instrument(skip(self))]
    pub async fn mark_overdue_debts(&self, today: NaiveDate) -> Result<u64, LedgerError> {
        self.mark_overdue_debts_in_txn(today)
            .await
            .inspect_err(|err| log_failure("mark_overdue_debts", err))
    }

    async fn mark_overdue_debts_in_txn(&self, today: NaiveDate) -> Result<u64, LedgerError> {
        let txn = self.begin().await?;
        let result = debts::Entity::update_many()
            .set(debts::ActiveModel {
                status: Set(DebtStatus::Overdue),
                ..Default::default()
            })
            .filter(debts::Column::Status.eq(DebtStatus::Active))
            .filter(debts::Column::DueDate.lt(today))
            .filter(
                Expr::col((debts::Entity, debts::Column::Remaining))
                    .lt(Expr::col((debts::Entity, debts::Column::Principal))),
            )
            .exec(&txn)
            .await
            .storage()?;
        txn.commit().await.storage()?;

        info!(marked = result.rows_affected, "overdue debts marked");
        Ok(result.rows_affected)
    }
}
