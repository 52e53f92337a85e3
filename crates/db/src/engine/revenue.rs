//! Revenue add and delete.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use tally_core::ledger::{
    AddRevenueInput, EntityRef, FundsCheck, LedgerError, LockPlan, PendingEvents, RevenueOutcome,
    ThresholdDomain, balance,
};
use tally_shared::types::{AccountId, OwnerId, RevenueId};
use tracing::{info, instrument};

use super::LedgerEngine;
use super::balance::BalanceMutator;
use super::locking::RowLocker;
use super::storage::{StorageResultExt, log_failure};
use crate::entities::revenues;

impl LedgerEngine {
    /// Records income into an account.
    ///
    /// # Errors
    ///
    /// - `Validation` for a non-positive amount or empty description
    /// - `NotFound` if the account does not exist for this owner
    /// - `LockTimeout` / `StorageFailure`
    #[instrument(
        skip(self, input),
        fields(owner_id = %input.owner_id, account_id = %input.account_id, amount = %input.amount)
    )]
    pub async fn add_revenue(&self, input: AddRevenueInput) -> Result<RevenueOutcome, LedgerError> {
        self.add_revenue_in_txn(input)
            .await
            .inspect_err(|err| log_failure("add_revenue", err))
    }

    async fn add_revenue_in_txn(&self, input: AddRevenueInput) -> Result<RevenueOutcome, LedgerError> {
        input.validate()?;

        let txn = self.begin().await?;
        let mut locker = RowLocker::new(&txn, Some(input.owner_id));
        let rows = locker
            .acquire(&LockPlan::new().with(input.account_id))
            .await?;

        let account_balance = balance::credit(rows.account(input.account_id)?.balance, input.amount);
        BalanceMutator::new(&txn)
            .write_account(input.account_id, account_balance)
            .await?;

        let revenue_id = RevenueId::new();
        revenues::ActiveModel {
            id: Set(revenue_id.0),
            owner_id: Set(input.owner_id.0),
            amount: Set(input.amount),
            revenue_date: Set(input.date),
            account_id: Set(input.account_id.0),
            description: Set(input.description.clone()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .storage()?;

        let mut events = PendingEvents::for_owner(input.owner_id);
        events.push(ThresholdDomain::AccountBalance, input.account_id, account_balance);
        self.commit(txn, events).await?;

        info!(%revenue_id, %account_balance, "revenue recorded");

        Ok(RevenueOutcome {
            revenue_id,
            account_balance,
        })
    }

    /// Deletes a revenue record and takes its amount back out of the
    /// account. The account may go negative.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the revenue does not exist for this owner
    /// - `LockTimeout` / `StorageFailure`
    #[instrument(skip(self), fields(owner_id = %owner_id, revenue_id = %revenue_id))]
    pub async fn delete_revenue(
        &self,
        owner_id: OwnerId,
        revenue_id: RevenueId,
    ) -> Result<(), LedgerError> {
        self.delete_revenue_in_txn(owner_id, revenue_id)
            .await
            .inspect_err(|err| log_failure("delete_revenue", err))
    }

    async fn delete_revenue_in_txn(
        &self,
        owner_id: OwnerId,
        revenue_id: RevenueId,
    ) -> Result<(), LedgerError> {
        let txn = self.begin().await?;
        let mut locker = RowLocker::new(&txn, Some(owner_id));

        let rows = locker.acquire(&LockPlan::new().with(revenue_id)).await?;
        let revenue = rows.revenue(revenue_id)?.clone();
        let account_id = AccountId::from_uuid(revenue.account_id);

        let rows = locker.acquire(&LockPlan::new().with(account_id)).await?;
        let account_balance = balance::debit(
            EntityRef::Account(account_id),
            rows.account(account_id)?.balance,
            revenue.amount,
            FundsCheck::Unchecked,
        )?;
        BalanceMutator::new(&txn)
            .write_account(account_id, account_balance)
            .await?;

        revenues::Entity::delete_by_id(revenue_id.0)
            .exec(&txn)
            .await
            .storage()?;

        let mut events = PendingEvents::for_owner(owner_id);
        events.push(ThresholdDomain::AccountBalance, account_id, account_balance);
        self.commit(txn, events).await?;

        info!(amount = %revenue.amount, %account_balance, "revenue reversed");
        Ok(())
    }
}
