//! Balance arithmetic shared by every operation.
//!
//! The storage layer reads a locked row, asks these functions for the new
//! value, and writes it back before releasing the lock at commit.

use rust_decimal::Decimal;

use super::error::{EntityRef, LedgerError};
use super::types::FundsCheck;

/// Returns the balance after removing `amount`.
///
/// With [`FundsCheck::Required`] a balance below `amount` is rejected and
/// nothing changes.
pub fn debit(
    entity: EntityRef,
    balance: Decimal,
    amount: Decimal,
    check: FundsCheck,
) -> Result<Decimal, LedgerError> {
    if check == FundsCheck::Required && balance < amount {
        return Err(LedgerError::InsufficientFunds {
            entity,
            required: amount,
            available: balance,
        });
    }
    Ok(balance - amount)
}

/// Returns the balance after adding `amount`.
#[must_use]
pub fn credit(balance: Decimal, amount: Decimal) -> Decimal {
    balance + amount
}
