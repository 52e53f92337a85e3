//! Goal contributions.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use tally_core::ledger::{
    ContributeInput, ContributionOutcome, EntityRef, LedgerError, LockPlan, PendingEvents,
    ThresholdDomain, balance, goal::plan_goal_credit,
};
use tally_shared::types::ContributionId;
use tracing::{info, instrument};

use super::LedgerEngine;
use super::balance::BalanceMutator;
use super::locking::RowLocker;
use super::storage::{StorageResultExt, log_failure};
use crate::entities::contributions;

impl LedgerEngine {
    /// Adds `amount` to a goal, optionally funded from an account.
    ///
    /// Whether the goal may pass its target and whether the account must
    /// cover the amount follow the engine's [`LedgerPolicy`].
    ///
    /// # Errors
    ///
    /// - `Validation` for a non-positive amount
    /// - `NotFound` if the goal or account does not exist for this owner
    /// - `CapExceeded` past the target when goals are capped
    /// - `InsufficientFunds` if the account cannot cover the amount
    /// - `LockTimeout` / `StorageFailure`
    ///
    /// [`LedgerPolicy`]: tally_core::ledger::LedgerPolicy
    #[instrument(
        skip(self, input),
        fields(owner_id = %input.owner_id, goal_id = %input.goal_id, amount = %input.amount)
    )]
    pub async fn contribute(
        &self,
        input: ContributeInput,
    ) -> Result<ContributionOutcome, LedgerError> {
        self.contribute_in_txn(input)
            .await
            .inspect_err(|err| log_failure("contribute", err))
    }

    async fn contribute_in_txn(
        &self,
        input: ContributeInput,
    ) -> Result<ContributionOutcome, LedgerError> {
        input.validate()?;

        let txn = self.begin().await?;
        let mut locker = RowLocker::new(&txn, Some(input.owner_id));
        let rows = locker
            .acquire(
                &LockPlan::new()
                    .with(input.goal_id)
                    .with_optional(input.account_id),
            )
            .await?;

        let goal = rows.goal(input.goal_id)?;
        let goal_current = plan_goal_credit(
            input.goal_id,
            goal.current_amount,
            goal.target_amount,
            input.amount,
            &self.policy,
        )?;

        let account = match input.account_id {
            Some(account_id) => Some((
                account_id,
                balance::debit(
                    EntityRef::Account(account_id),
                    rows.account(account_id)?.balance,
                    input.amount,
                    self.policy.contribution_funds_check(),
                )?,
            )),
            None => None,
        };

        let contribution_id = ContributionId::new();
        contributions::ActiveModel {
            id: Set(contribution_id.0),
            owner_id: Set(input.owner_id.0),
            goal_id: Set(input.goal_id.0),
            account_id: Set(input.account_id.map(|id| id.0)),
            amount: Set(input.amount),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .storage()?;

        let mutator = BalanceMutator::new(&txn);
        let mut events = PendingEvents::for_owner(input.owner_id);

        mutator.write_goal(input.goal_id, goal_current).await?;
        events.push(ThresholdDomain::GoalProgress, input.goal_id, goal_current);

        if let Some((account_id, updated)) = account {
            mutator.write_account(account_id, updated).await?;
            events.push(ThresholdDomain::AccountBalance, account_id, updated);
        }

        self.commit(txn, events).await?;

        info!(%contribution_id, %goal_current, "contribution recorded");

        Ok(ContributionOutcome {
            contribution_id,
            goal_current,
            account_balance: account.map(|(_, updated)| updated),
        })
    }
}
