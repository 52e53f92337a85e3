//! Transfers between accounts and goals.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tally_core::ledger::{
    EntityRef, FundsCheck, LedgerError, LockPlan, PendingEvents, ThresholdDomain, TransferInput,
    TransferOutcome, TransferRoute, balance, goal::plan_goal_credit,
};
use tally_shared::types::TransferId;
use tracing::{info, instrument};

use super::LedgerEngine;
use super::balance::BalanceMutator;
use super::locking::{LockedRows, RowLocker};
use super::storage::{StorageResultExt, log_failure};
use crate::entities::{sea_orm_active_enums::TransferType, transfers};

impl LedgerEngine {
    /// Moves `amount` from the route's source to its destination.
    ///
    /// Both rows are locked in the global order regardless of direction, so
    /// opposite transfers between the same pair queue instead of
    /// deadlocking.
    ///
    /// # Errors
    ///
    /// - `Validation` for a non-positive amount or identical endpoints
    /// - `NotFound` if either endpoint does not exist for this owner
    /// - `InsufficientFunds` if the source holds less than `amount`
    /// - `CapExceeded` for a goal past its target when goals are capped
    /// - `LockTimeout` / `StorageFailure`
    #[instrument(
        skip(self, input),
        fields(owner_id = %input.owner_id, kind = ?input.route.kind(), amount = %input.amount)
    )]
    pub async fn transfer(&self, input: TransferInput) -> Result<TransferOutcome, LedgerError> {
        self.transfer_in_txn(input)
            .await
            .inspect_err(|err| log_failure("transfer", err))
    }

    async fn transfer_in_txn(&self, input: TransferInput) -> Result<TransferOutcome, LedgerError> {
        input.validate()?;

        let source = input.route.source();
        let destination = input.route.destination();

        let txn = self.begin().await?;
        let mut locker = RowLocker::new(&txn, Some(input.owner_id));
        let rows = locker
            .acquire(&LockPlan::new().with(source).with(destination))
            .await?;

        let source_balance = balance::debit(
            source,
            current_value(&rows, source)?,
            input.amount,
            FundsCheck::Required,
        )?;
        let destination_balance = match input.route {
            TransferRoute::AccountToGoal { to, .. } => {
                let goal = rows.goal(to)?;
                plan_goal_credit(
                    to,
                    goal.current_amount,
                    goal.target_amount,
                    input.amount,
                    &self.policy,
                )?
            }
            TransferRoute::GoalToAccount { .. } | TransferRoute::AccountToAccount { .. } => {
                balance::credit(current_value(&rows, destination)?, input.amount)
            }
        };

        let mutator = BalanceMutator::new(&txn);
        mutator.write(source, source_balance).await?;
        mutator.write(destination, destination_balance).await?;

        let transfer_id = TransferId::new();
        transfers::ActiveModel {
            id: Set(transfer_id.0),
            owner_id: Set(input.owner_id.0),
            transfer_type: Set(TransferType::from(input.route.kind())),
            source_id: Set(source.id()),
            destination_id: Set(destination.id()),
            amount: Set(input.amount),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .storage()?;

        let mut events = PendingEvents::for_owner(input.owner_id);
        events.push(domain_of(source), source.id(), source_balance);
        events.push(domain_of(destination), destination.id(), destination_balance);
        self.commit(txn, events).await?;

        info!(
            %transfer_id,
            %source,
            %destination,
            %source_balance,
            %destination_balance,
            "transfer committed"
        );

        Ok(TransferOutcome {
            transfer_id,
            source_balance,
            destination_balance,
        })
    }
}

/// Balance of a locked transfer endpoint.
fn current_value(rows: &LockedRows, entity: EntityRef) -> Result<Decimal, LedgerError> {
    match entity {
        EntityRef::Account(id) => Ok(rows.account(id)?.balance),
        EntityRef::Goal(id) => Ok(rows.goal(id)?.current_amount),
        other => Err(LedgerError::NotFound(other)),
    }
}

fn domain_of(entity: EntityRef) -> ThresholdDomain {
    match entity {
        EntityRef::Goal(_) => ThresholdDomain::GoalProgress,
        _ => ThresholdDomain::AccountBalance,
    }
}
