//! Row locking in the global order.
//!
//! [`RowLocker`] takes `SELECT … FOR UPDATE` locks for every row a
//! [`LockPlan`] names, in plan order, and checks that successive phases of
//! one operation never step backwards in the order.

use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, EntityTrait, PrimaryKeyTrait, QuerySelect};
use tally_core::ledger::{EntityRef, LedgerError, LockPlan, LockSequence, LockTarget};
use tally_shared::types::{
    AccountId, BudgetId, DebtId, ExpenseId, GoalId, OwnerId, RevenueId, SubscriptionId,
};
use tracing::error;
use uuid::Uuid;

use super::storage::StorageResultExt;
use crate::entities::{accounts, budgets, debts, expenses, goals, revenues, subscriptions};

/// A row that belongs to one owner.
pub(crate) trait Owned {
    fn owner(&self) -> Uuid;
}

macro_rules! impl_owned {
    ($($module:ident),*) => {
        $(
            impl Owned for $module::Model {
                fn owner(&self) -> Uuid {
                    self.owner_id
                }
            }
        )*
    };
}

impl_owned!(accounts, goals, debts, budgets, subscriptions, expenses, revenues);

/// Rows locked by one call to [`RowLocker::acquire`].
#[derive(Debug, Default)]
pub(crate) struct LockedRows {
    accounts: HashMap<AccountId, accounts::Model>,
    goals: HashMap<GoalId, goals::Model>,
    debts: HashMap<DebtId, debts::Model>,
    budgets: HashMap<BudgetId, budgets::Model>,
    subscriptions: HashMap<SubscriptionId, subscriptions::Model>,
    expenses: HashMap<ExpenseId, expenses::Model>,
    revenues: HashMap<RevenueId, revenues::Model>,
}

impl LockedRows {
    pub(crate) fn account(&self, id: AccountId) -> Result<&accounts::Model, LedgerError> {
        self.accounts
            .get(&id)
            .ok_or(LedgerError::NotFound(EntityRef::Account(id)))
    }

    pub(crate) fn goal(&self, id: GoalId) -> Result<&goals::Model, LedgerError> {
        self.goals
            .get(&id)
            .ok_or(LedgerError::NotFound(EntityRef::Goal(id)))
    }

    pub(crate) fn debt(&self, id: DebtId) -> Result<&debts::Model, LedgerError> {
        self.debts
            .get(&id)
            .ok_or(LedgerError::NotFound(EntityRef::Debt(id)))
    }

    pub(crate) fn budget(&self, id: BudgetId) -> Result<&budgets::Model, LedgerError> {
        self.budgets
            .get(&id)
            .ok_or(LedgerError::NotFound(EntityRef::Budget(id)))
    }

    pub(crate) fn subscription(
        &self,
        id: SubscriptionId,
    ) -> Result<&subscriptions::Model, LedgerError> {
        self.subscriptions
            .get(&id)
            .ok_or(LedgerError::NotFound(EntityRef::Subscription(id)))
    }

    pub(crate) fn expense(&self, id: ExpenseId) -> Result<&expenses::Model, LedgerError> {
        self.expenses
            .get(&id)
            .ok_or(LedgerError::NotFound(EntityRef::Expense(id)))
    }

    pub(crate) fn revenue(&self, id: RevenueId) -> Result<&revenues::Model, LedgerError> {
        self.revenues
            .get(&id)
            .ok_or(LedgerError::NotFound(EntityRef::Revenue(id)))
    }
}

/// Takes row locks for one transaction.
pub(crate) struct RowLocker<'t> {
    txn: &'t DatabaseTransaction,
    owner: Option<OwnerId>,
    sequence: LockSequence,
}

impl<'t> RowLocker<'t> {
    /// Creates a locker. With `owner` set, rows of any other owner are
    /// reported as not found.
    pub(crate) fn new(txn: &'t DatabaseTransaction, owner: Option<OwnerId>) -> Self {
        Self {
            txn,
            owner,
            sequence: LockSequence::new(),
        }
    }

    /// Restricts later phases to rows of `owner`.
    pub(crate) fn restrict_to(&mut self, owner: OwnerId) {
        self.owner = Some(owner);
    }

    /// Locks every row in `plan`, in plan order.
    pub(crate) async fn acquire(&mut self, plan: &LockPlan) -> Result<LockedRows, LedgerError> {
        let mut rows = LockedRows::default();
        for &target in plan.targets() {
            if !self.sequence.admit(target) {
                error!(
                    ?target,
                    held = self.sequence.held(),
                    "lock requested out of global order"
                );
                return Err(LedgerError::StorageFailure);
            }

            let entity = EntityRef::from(target);
            match target {
                LockTarget::Account(id) => {
                    let row = self.lock::<accounts::Entity>(id.0, entity).await?;
                    rows.accounts.insert(id, row);
                }
                LockTarget::Goal(id) => {
                    let row = self.lock::<goals::Entity>(id.0, entity).await?;
                    rows.goals.insert(id, row);
                }
                LockTarget::Debt(id) => {
                    let row = self.lock::<debts::Entity>(id.0, entity).await?;
                    rows.debts.insert(id, row);
                }
                LockTarget::Budget(id) => {
                    let row = self.lock::<budgets::Entity>(id.0, entity).await?;
                    rows.budgets.insert(id, row);
                }
                LockTarget::Subscription(id) => {
                    let row = self.lock::<subscriptions::Entity>(id.0, entity).await?;
                    rows.subscriptions.insert(id, row);
                }
                LockTarget::Expense(id) => {
                    let row = self.lock::<expenses::Entity>(id.0, entity).await?;
                    rows.expenses.insert(id, row);
                }
                LockTarget::Revenue(id) => {
                    let row = self.lock::<revenues::Entity>(id.0, entity).await?;
                    rows.revenues.insert(id, row);
                }
            }
        }
        Ok(rows)
    }

    async fn lock<E>(&self, id: Uuid, entity: EntityRef) -> Result<E::Model, LedgerError>
    where
        E: EntityTrait,
        E::Model: Owned,
        Uuid: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        let row = E::find_by_id(id)
            .lock_exclusive()
            .one(self.txn)
            .await
            .storage()?
            .ok_or(LedgerError::NotFound(entity))?;

        match self.owner {
            Some(owner) if row.owner() != owner.0 => Err(LedgerError::NotFound(entity)),
            _ => Ok(row),
        }
    }
}
