//! Global lock ordering.
//!
//! Every operation that mutates more than one row locks those rows in one
//! total order: entity-type rank first, then id. Two operations touching the
//! same pair of rows therefore always queue on the same row first and can
//! never wait on each other in a cycle.
//!
//! Operations that only learn some of their rows after locking others (an
//! expense delete reads the account from the expense row) lock in phases;
//! every later phase must rank strictly above what is already held, which
//! [`LockSequence`] checks.

use std::cmp::Ordering;

use tally_shared::types::{
    AccountId, BudgetId, DebtId, ExpenseId, GoalId, RevenueId, SubscriptionId,
};
use uuid::Uuid;

use super::error::EntityRef;

/// A row that an operation intends to lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockTarget {
    /// Expense record (locked before it is reversed).
    Expense(ExpenseId),
    /// Revenue record (locked before it is reversed).
    Revenue(RevenueId),
    /// Subscription row.
    Subscription(SubscriptionId),
    /// Debt row.
    Debt(DebtId),
    /// Account row.
    Account(AccountId),
    /// Goal row.
    Goal(GoalId),
    /// Budget row.
    Budget(BudgetId),
}

impl LockTarget {
    /// Entity-type rank; lower ranks are locked first.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Expense(_) | Self::Revenue(_) => 0,
            Self::Subscription(_) => 1,
            Self::Debt(_) => 2,
            Self::Account(_) => 3,
            Self::Goal(_) => 4,
            Self::Budget(_) => 5,
        }
    }

    /// Raw id of the row.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Expense(id) => id.0,
            Self::Revenue(id) => id.0,
            Self::Subscription(id) => id.0,
            Self::Debt(id) => id.0,
            Self::Account(id) => id.0,
            Self::Goal(id) => id.0,
            Self::Budget(id) => id.0,
        }
    }

    /// Position of this row in the global order.
    #[must_use]
    pub fn order_key(&self) -> (u8, Uuid) {
        (self.rank(), self.id())
    }
}

impl PartialOrd for LockTarget {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LockTarget {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

macro_rules! lock_target_from_id {
    ($($id:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$id> for LockTarget {
                fn from(id: $id) -> Self {
                    Self::$variant(id)
                }
            }
        )*
    };
}

lock_target_from_id! {
    ExpenseId => Expense,
    RevenueId => Revenue,
    SubscriptionId => Subscription,
    DebtId => Debt,
    AccountId => Account,
    GoalId => Goal,
    BudgetId => Budget,
}

impl From<EntityRef> for LockTarget {
    fn from(entity: EntityRef) -> Self {
        match entity {
            EntityRef::Account(id) => Self::Account(id),
            EntityRef::Goal(id) => Self::Goal(id),
            EntityRef::Debt(id) => Self::Debt(id),
            EntityRef::Budget(id) => Self::Budget(id),
            EntityRef::Subscription(id) => Self::Subscription(id),
            EntityRef::Expense(id) => Self::Expense(id),
            EntityRef::Revenue(id) => Self::Revenue(id),
        }
    }
}

impl From<LockTarget> for EntityRef {
    fn from(target: LockTarget) -> Self {
        match target {
            LockTarget::Account(id) => Self::Account(id),
            LockTarget::Goal(id) => Self::Goal(id),
            LockTarget::Debt(id) => Self::Debt(id),
            LockTarget::Budget(id) => Self::Budget(id),
            LockTarget::Subscription(id) => Self::Subscription(id),
            LockTarget::Expense(id) => Self::Expense(id),
            LockTarget::Revenue(id) => Self::Revenue(id),
        }
    }
}

/// The set of rows one locking phase will take, in acquisition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockPlan {
    targets: Vec<LockTarget>,
}

impl LockPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a row to the plan.
    #[must_use]
    pub fn with(mut self, target: impl Into<LockTarget>) -> Self {
        self.insert(target.into());
        self
    }

    /// Adds a row to the plan if present.
    #[must_use]
    pub fn with_optional<T: Into<LockTarget>>(self, target: Option<T>) -> Self {
        match target {
            Some(target) => self.with(target),
            None => self,
        }
    }

    fn insert(&mut self, target: LockTarget) {
        if let Err(position) = self.targets.binary_search(&target) {
            self.targets.insert(position, target);
        }
    }

    /// Rows in the order they must be locked. Duplicates are removed.
    #[must_use]
    pub fn targets(&self) -> &[LockTarget] {
        &self.targets
    }

    /// Returns true if the plan locks nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Tracks the locks an operation holds and rejects out-of-order acquisition.
#[derive(Debug, Clone, Default)]
pub struct LockSequence {
    last: Option<LockTarget>,
    held: usize,
}

impl LockSequence {
    /// Creates a sequence with nothing held.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `target` as acquired. Returns false if taking it now would
    /// break the global order.
    pub fn admit(&mut self, target: LockTarget) -> bool {
        if self.last.is_some_and(|last| target <= last) {
            return false;
        }
        self.last = Some(target);
        self.held += 1;
        true
    }

    /// Number of locks taken so far.
    #[must_use]
    pub fn held(&self) -> usize {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(n: u128) -> AccountId {
        AccountId::from_uuid(Uuid::from_u128(n))
    }

    fn goal(n: u128) -> GoalId {
        GoalId::from_uuid(Uuid::from_u128(n))
    }

    #[test]
    fn test_accounts_lock_before_goals() {
        // Goal id sorts lower than the account id; type rank still wins.
        let plan = LockPlan::new().with(goal(1)).with(account(9));
        assert_eq!(
            plan.targets(),
            &[LockTarget::Account(account(9)), LockTarget::Goal(goal(1))]
        );
    }

    #[test]
    fn test_lower_account_id_first_regardless_of_direction() {
        let a_to_b = LockPlan::new().with(account(1)).with(account(2));
        let b_to_a = LockPlan::new().with(account(2)).with(account(1));
        assert_eq!(a_to_b, b_to_a);
        assert_eq!(a_to_b.targets()[0], LockTarget::Account(account(1)));
    }

    #[test]
    fn test_duplicates_collapse() {
        let plan = LockPlan::new().with(account(1)).with(account(1));
        assert_eq!(plan.targets().len(), 1);
    }

    #[test]
    fn test_optional_targets() {
        let plan = LockPlan::new()
            .with(account(1))
            .with_optional(None::<GoalId>)
            .with_optional(Some(goal(3)));
        assert_eq!(plan.targets().len(), 2);
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_rank_order_covers_every_type() {
        let subscription = SubscriptionId::from_uuid(Uuid::from_u128(99));
        let debt = DebtId::from_uuid(Uuid::from_u128(98));
        let budget = BudgetId::from_uuid(Uuid::from_u128(0));
        let expense = ExpenseId::from_uuid(Uuid::from_u128(97));

        let plan = LockPlan::new()
            .with(LockTarget::Budget(budget))
            .with(goal(5))
            .with(account(6))
            .with(LockTarget::Debt(debt))
            .with(LockTarget::Subscription(subscription))
            .with(LockTarget::Expense(expense));

        let ranks: Vec<u8> = plan.targets().iter().map(LockTarget::rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_sequence_rejects_going_backwards() {
        let mut sequence = LockSequence::new();
        assert!(sequence.admit(LockTarget::Account(account(2))));
        assert!(sequence.admit(LockTarget::Goal(goal(1))));
        assert!(!sequence.admit(LockTarget::Account(account(3))));
        assert!(!sequence.admit(LockTarget::Goal(goal(1))));
        assert_eq!(sequence.held(), 2);
    }

    #[test]
    fn test_entity_ref_round_trip() {
        let target = LockTarget::Goal(goal(4));
        let entity: EntityRef = target.into();
        assert_eq!(LockTarget::from(entity), target);
    }
}
