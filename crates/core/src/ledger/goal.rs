//! Goal funding rules.

use rust_decimal::Decimal;
use tally_shared::types::GoalId;

use super::balance;
use super::error::{EntityRef, LedgerError};
use super::policy::LedgerPolicy;

/// Returns goal progress after crediting `amount`.
///
/// With `cap_goal_contributions` on, a credit that would pass `target` is
/// rejected.
pub fn plan_goal_credit(
    goal_id: GoalId,
    current: Decimal,
    target: Decimal,
    amount: Decimal,
    policy: &LedgerPolicy,
) -> Result<Decimal, LedgerError> {
    let attempted = balance::credit(current, amount);
    if policy.cap_goal_contributions && attempted > target {
        return Err(LedgerError::CapExceeded {
            entity: EntityRef::Goal(goal_id),
            cap: target,
            attempted,
        });
    }
    Ok(attempted)
}
