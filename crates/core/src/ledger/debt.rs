//! Debt repayment rules.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::DebtId;

use super::error::{EntityRef, LedgerError};
use super::types::DebtStatus;

/// Debt state after a repayment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepaymentPlan {
    /// Repayment tally after the payment.
    pub remaining: Decimal,
    /// Status after the payment.
    pub status: DebtStatus,
}

/// Applies a repayment of `amount` to a debt.
///
/// The tally may never pass `principal`; a payment that would is rejected
/// rather than truncated.
pub fn plan_repayment(
    debt_id: DebtId,
    principal: Decimal,
    remaining: Decimal,
    status: DebtStatus,
    amount: Decimal,
) -> Result<RepaymentPlan, LedgerError> {
    let attempted = remaining + amount;
    if attempted > principal {
        return Err(LedgerError::CapExceeded {
            entity: EntityRef::Debt(debt_id),
            cap: principal,
            attempted,
        });
    }

    let remaining = attempted.min(principal);
    let status = if remaining >= principal {
        DebtStatus::Completed
    } else {
        status
    };
    Ok(RepaymentPlan { remaining, status })
}

/// Returns true if an active debt is past due and not fully repaid.
#[must_use]
pub fn is_overdue(
    status: DebtStatus,
    due_date: Option<NaiveDate>,
    remaining: Decimal,
    principal: Decimal,
    today: NaiveDate,
) -> bool {
    status == DebtStatus::Active
        && remaining < principal
        && due_date.is_some_and(|due| due < today)
}
