//! Balance writes.
//!
//! Every balance column the engine changes is written through
//! [`BalanceMutator`], after the new value has been computed by the
//! `tally_core::ledger::balance` rules against a row this transaction holds
//! locked.

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Unchanged, DatabaseTransaction, Set};
use tally_core::ledger::{EntityRef, LedgerError};
use tally_shared::types::{AccountId, BudgetId, DebtId, GoalId};
use tracing::error;

use super::storage::StorageResultExt;
use crate::entities::{accounts, budgets, debts, goals, sea_orm_active_enums::DebtStatus};

pub(crate) struct BalanceMutator<'t> {
    txn: &'t DatabaseTransaction,
}

impl<'t> BalanceMutator<'t> {
    pub(crate) fn new(txn: &'t DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Writes the balance of a locked account or goal.
    pub(crate) async fn write(&self, entity: EntityRef, value: Decimal) -> Result<(), LedgerError> {
        match entity {
            EntityRef::Account(id) => self.write_account(id, value).await,
            EntityRef::Goal(id) => self.write_goal(id, value).await,
            EntityRef::Budget(id) => self.write_budget(id, value).await,
            other => {
                error!(entity = %other, "entity has no balance column");
                Err(LedgerError::StorageFailure)
            }
        }
    }

    pub(crate) async fn write_account(
        &self,
        id: AccountId,
        balance: Decimal,
    ) -> Result<(), LedgerError> {
        accounts::ActiveModel {
            id: Unchanged(id.0),
            balance: Set(balance),
            ..Default::default()
        }
        .update(self.txn)
        .await
        .storage()?;
        Ok(())
    }

    pub(crate) async fn write_goal(&self, id: GoalId, current: Decimal) -> Result<(), LedgerError> {
        goals::ActiveModel {
            id: Unchanged(id.0),
            current_amount: Set(current),
            ..Default::default()
        }
        .update(self.txn)
        .await
        .storage()?;
        Ok(())
    }

    pub(crate) async fn write_budget(
        &self,
        id: BudgetId,
        remaining: Decimal,
    ) -> Result<(), LedgerError> {
        budgets::ActiveModel {
            id: Unchanged(id.0),
            remaining_amount: Set(remaining),
            ..Default::default()
        }
        .update(self.txn)
        .await
        .storage()?;
        Ok(())
    }

    pub(crate) async fn write_debt(
        &self,
        id: DebtId,
        remaining: Decimal,
        status: DebtStatus,
    ) -> Result<(), LedgerError> {
        debts::ActiveModel {
            id: Unchanged(id.0),
            remaining: Set(remaining),
            status: Set(status),
            ..Default::default()
        }
        .update(self.txn)
        .await
        .storage()?;
        Ok(())
    }
}
