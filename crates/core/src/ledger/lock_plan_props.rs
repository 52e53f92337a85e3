//! Property-based tests for lock ordering.

use proptest::prelude::*;
use tally_shared::types::{AccountId, BudgetId, DebtId, GoalId, SubscriptionId};
use uuid::Uuid;

use super::lock_plan::{LockPlan, LockSequence, LockTarget};

fn target_strategy() -> impl Strategy<Value = LockTarget> {
    let id = (0u128..8).prop_map(Uuid::from_u128);
    prop_oneof![
        id.clone().prop_map(|u| LockTarget::Subscription(SubscriptionId::from_uuid(u))),
        id.clone().prop_map(|u| LockTarget::Debt(DebtId::from_uuid(u))),
        id.clone().prop_map(|u| LockTarget::Account(AccountId::from_uuid(u))),
        id.clone().prop_map(|u| LockTarget::Goal(GoalId::from_uuid(u))),
        id.prop_map(|u| LockTarget::Budget(BudgetId::from_uuid(u))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Insertion order never changes the plan.
    #[test]
    fn prop_plan_independent_of_insertion_order(
        targets in prop::collection::vec(target_strategy(), 0..10),
    ) {
        let forward = targets.iter().fold(LockPlan::new(), |plan, t| plan.with(*t));
        let backward = targets.iter().rev().fold(LockPlan::new(), |plan, t| plan.with(*t));
        prop_assert_eq!(forward, backward);
    }

    /// A plan is strictly increasing, so a sequence admits every step.
    #[test]
    fn prop_plan_is_admissible(
        targets in prop::collection::vec(target_strategy(), 0..10),
    ) {
        let plan = targets.iter().fold(LockPlan::new(), |plan, t| plan.with(*t));
        let mut sequence = LockSequence::new();
        for target in plan.targets() {
            prop_assert!(sequence.admit(*target));
        }
        prop_assert_eq!(sequence.held(), plan.targets().len());
    }
}
