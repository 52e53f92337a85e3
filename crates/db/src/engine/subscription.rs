//! Subscription renewal, catch-up and the due sweep.

use std::convert::Infallible;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tally_core::ledger::{
    EntityRef, FundsCheck, LedgerError, LockPlan, PendingEvents, ThresholdDomain, balance,
};
use tally_core::subscription::{
    BillingFrequency, CatchUpDriver, CatchUpReport, RenewalCycle, RenewalOutcome, due_halt,
    next_due_after, renewal_description,
};
use tally_shared::types::{AccountId, ExpenseId, OwnerId, SubscriptionId};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::LedgerEngine;
use super::balance::BalanceMutator;
use super::locking::RowLocker;
use super::storage::{StorageResultExt, log_failure};
use crate::entities::{categories::SUBSCRIPTIONS_CATEGORY_ID, expenses, subscriptions};

impl LedgerEngine {
    /// Runs one renewal cycle: charges the linked account, advances the due
    /// date by one period and records the charge as an expense in the
    /// system "Subscriptions" category.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the subscription or its account does not exist
    /// - `NoLinkedAccount` if no account is linked
    /// - `Inactive` if the subscription is inactive
    /// - `InsufficientFunds` if the account cannot cover the charge
    /// - `LockTimeout` / `StorageFailure`
    #[instrument(skip(self), fields(subscription_id = %subscription_id))]
    pub async fn renew_subscription_once(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<RenewalOutcome, LedgerError> {
        match self
            .renew_in_txn(subscription_id, |_| Ok::<(), Infallible>(()))
            .await
            .inspect_err(|err| log_failure("renew_subscription_once", err))?
        {
            Ok(outcome) => Ok(outcome),
            Err(never) => match never {},
        }
    }

    /// Runs one renewal cycle only if one is owed for `today`.
    ///
    /// Auto-renew and the due date are checked on the locked row, so of two
    /// overlapping callers the second sees the first's committed due date
    /// and charges nothing.
    ///
    /// # Errors
    ///
    /// As [`Self::renew_subscription_once`].
    #[instrument(skip(self), fields(subscription_id = %subscription_id, today = %today))]
    pub async fn renew_cycle_if_due(
        &self,
        subscription_id: SubscriptionId,
        today: NaiveDate,
    ) -> Result<RenewalCycle, LedgerError> {
        let cycle = self
            .renew_in_txn(subscription_id, |row| {
                match due_halt(row.auto_renew, row.next_due_date, today) {
                    Some(halt) => Err(halt),
                    None => Ok(()),
                }
            })
            .await
            .inspect_err(|err| log_failure("renew_cycle_if_due", err))?;
        Ok(match cycle {
            Ok(outcome) => RenewalCycle::Renewed(outcome),
            Err(halt) => RenewalCycle::Halted(halt),
        })
    }

    /// Locks the subscription, asks `gate` whether to go ahead, and if so
    /// charges one cycle. A gate refusal rolls back without writing.
    async fn renew_in_txn<H>(
        &self,
        subscription_id: SubscriptionId,
        gate: impl FnOnce(&subscriptions::Model) -> Result<(), H>,
    ) -> Result<Result<RenewalOutcome, H>, LedgerError> {
        let txn = self.begin().await?;
        let mut locker = RowLocker::new(&txn, None);

        let rows = locker
            .acquire(&LockPlan::new().with(subscription_id))
            .await?;
        let subscription = rows.subscription(subscription_id)?.clone();
        if let Err(halt) = gate(&subscription) {
            return Ok(Err(halt));
        }
        let owner_id = OwnerId::from_uuid(subscription.owner_id);

        let account_id = subscription
            .account_id
            .map(AccountId::from_uuid)
            .ok_or(LedgerError::NoLinkedAccount(subscription_id))?;
        if !subscription.is_active {
            return Err(LedgerError::Inactive(subscription_id));
        }

        locker.restrict_to(owner_id);
        let rows = locker.acquire(&LockPlan::new().with(account_id)).await?;
        let account_balance = balance::debit(
            EntityRef::Account(account_id),
            rows.account(account_id)?.balance,
            subscription.amount,
            FundsCheck::Required,
        )?;

        let frequency = BillingFrequency::parse_or_monthly(&subscription.frequency);
        let charged_for = subscription.next_due_date;
        let next_due_date = next_due_after(subscription_id, frequency, charged_for)?;

        let mutator = BalanceMutator::new(&txn);
        mutator.write_account(account_id, account_balance).await?;

        subscriptions::ActiveModel {
            id: Unchanged(subscription.id),
            next_due_date: Set(next_due_date),
            is_active: Set(true),
            ..Default::default()
        }
        .update(&txn)
        .await
        .storage()?;

        let expense_id = ExpenseId::new();
        expenses::ActiveModel {
            id: Set(expense_id.0),
            owner_id: Set(owner_id.0),
            amount: Set(subscription.amount),
            expense_date: Set(charged_for),
            category_id: Set(SUBSCRIPTIONS_CATEGORY_ID),
            account_id: Set(account_id.0),
            goal_id: Set(None),
            goal_drawdown: Set(Decimal::ZERO),
            budget_id: Set(None),
            subscription_id: Set(Some(subscription.id)),
            description: Set(renewal_description(&subscription.name)),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .storage()?;

        let mut events = PendingEvents::for_owner(owner_id);
        events.push(ThresholdDomain::AccountBalance, account_id, account_balance);
        self.commit(txn, events).await?;

        info!(
            %expense_id,
            %frequency,
            %charged_for,
            %next_due_date,
            "subscription renewed"
        );

        Ok(Ok(RenewalOutcome {
            next_due_date,
            expense_id,
            account_balance,
        }))
    }

    /// Renews an overdue subscription cycle by cycle until it is due after
    /// `today`, auto-renew is off, a cycle fails, or the configured cycle
    /// limit is reached.
    ///
    /// Each cycle commits on its own, and whether it runs is decided on the
    /// locked row, so concurrent runs over the same subscription charge each
    /// owed cycle once between them. A failed cycle ends the run; the report
    /// keeps the cycles that committed before it.
    ///
    /// # Errors
    ///
    /// `NotFound` if the subscription does not exist, or a storage error
    /// while reading it before the first cycle. Failures after that are
    /// reported in [`CatchUpReport::stopped_by`].
    #[instrument(skip(self), fields(subscription_id = %subscription_id, today = %today))]
    pub async fn catch_up_subscription(
        &self,
        subscription_id: SubscriptionId,
        today: NaiveDate,
    ) -> Result<CatchUpReport, LedgerError> {
        // Seeds the report only; every go/no-go is taken under the lock.
        let seed = self.find_subscription(subscription_id).await?;
        let mut driver = CatchUpDriver::new(
            self.config.max_catch_up_cycles,
            today,
            seed.next_due_date,
        );

        let halt = loop {
            let cycle = self
                .renew_in_txn(subscription_id, |row| {
                    match driver.check(row.auto_renew, row.next_due_date) {
                        Some(halt) => Err(halt),
                        None => Ok(()),
                    }
                })
                .await
                .inspect_err(|err| log_failure("catch_up_subscription", err));
            match cycle {
                Ok(Ok(outcome)) => driver.record_renewal(outcome.next_due_date),
                Ok(Err(halt)) => break halt,
                Err(err) => break driver.record_failure(err),
            }
        };

        let report = driver.finish(halt);
        info!(
            cycles = report.cycles,
            next_due_date = %report.next_due_date,
            halt = ?report.halt,
            "catch-up finished"
        );
        Ok(report)
    }

    /// Catches up every active auto-renewing subscription due on or before
    /// `today`. One subscription failing does not stop the others.
    ///
    /// # Errors
    ///
    /// Only if the due subscriptions cannot be listed.
    #[instrument(skip(self))]
    pub async fn renew_due_subscriptions(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<(SubscriptionId, CatchUpReport)>, LedgerError> {
        let due: Vec<Uuid> = subscriptions::Entity::find()
            .select_only()
            .column(subscriptions::Column::Id)
            .filter(subscriptions::Column::IsActive.eq(true))
            .filter(subscriptions::Column::AutoRenew.eq(true))
            .filter(subscriptions::Column::NextDueDate.lte(today))
            .order_by_asc(subscriptions::Column::NextDueDate)
            .into_tuple()
            .all(&self.db)
            .await
            .storage()
            .inspect_err(|err| log_failure("renew_due_subscriptions", err))?;

        let mut reports = Vec::with_capacity(due.len());
        for id in due.into_iter().map(SubscriptionId::from_uuid) {
            match self.catch_up_subscription(id, today).await {
                Ok(report) => reports.push((id, report)),
                Err(err) => warn!(subscription_id = %id, error = %err, "subscription skipped"),
            }
        }

        info!(processed = reports.len(), "renewal sweep finished");
        Ok(reports)
    }

    async fn find_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<subscriptions::Model, LedgerError> {
        subscriptions::Entity::find_by_id(subscription_id.0)
            .one(&self.db)
            .await
            .storage()?
            .ok_or(LedgerError::NotFound(EntityRef::Subscription(subscription_id)))
    }
}
