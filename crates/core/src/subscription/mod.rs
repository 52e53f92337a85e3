//! Subscription renewal rules.

pub mod catch_up;
pub mod frequency;

#[cfg(test)]
mod frequency_props;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{ExpenseId, SubscriptionId};

pub use catch_up::{
    CatchUpDriver, CatchUpHalt, CatchUpReport, DEFAULT_MAX_CATCH_UP_CYCLES, RenewalCycle, due_halt,
};
pub use frequency::{BillingFrequency, UnknownFrequency};

use crate::ledger::LedgerError;

/// Description written on the expense a renewal creates.
#[must_use]
pub fn renewal_description(name: &str) -> String {
    format!("Subscription: {name}")
}

/// Next due date after one cycle, or a validation error if the date would
/// leave the supported calendar range.
pub fn next_due_after(
    subscription_id: SubscriptionId,
    frequency: BillingFrequency,
    due: NaiveDate,
) -> Result<NaiveDate, LedgerError> {
    frequency.advance(due).ok_or_else(|| {
        LedgerError::validation(format!(
            "subscription {subscription_id} due date {due} cannot advance further"
        ))
    })
}

/// Result of one renewal cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalOutcome {
    /// Due date after the renewal.
    pub next_due_date: NaiveDate,
    /// Expense recorded for the charge.
    pub expense_id: ExpenseId,
    /// Linked account balance after the charge.
    pub account_balance: Decimal,
}
