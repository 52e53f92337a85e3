//! Input validation, run before any transaction begins.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{
    AddExpenseInput, AddRevenueInput, ContributeInput, RepayDebtInput, TransferInput,
    TransferRoute,
};

/// Decimal places a stored amount can hold.
pub const MONEY_SCALE: u32 = 4;

/// Longest description accepted on expense and revenue records.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Largest amount accepted by a single operation (fits `NUMERIC(19,4)` with
/// headroom for running balances).
#[must_use]
pub fn max_amount() -> Decimal {
    Decimal::from(1_000_000_000_000_i64)
}

/// Validates a money amount: strictly positive, at most four decimal places,
/// below [`max_amount`].
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(LedgerError::validation(format!(
            "amount {amount} has more than {MONEY_SCALE} decimal places"
        )));
    }
    if amount >= max_amount() {
        return Err(LedgerError::validation(format!(
            "amount {amount} exceeds the maximum of {}",
            max_amount()
        )));
    }
    Ok(())
}

/// Validates a free-text description.
pub fn validate_description(description: &str) -> Result<(), LedgerError> {
    if description.trim().is_empty() {
        return Err(LedgerError::validation("description must not be empty"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(LedgerError::validation(format!(
            "description exceeds {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

impl AddExpenseInput {
    /// Validates the input.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)?;
        validate_description(&self.description)
    }
}

impl AddRevenueInput {
    /// Validates the input.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)?;
        validate_description(&self.description)
    }
}

impl TransferInput {
    /// Validates the input. Source and destination must differ.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)?;
        if let TransferRoute::AccountToAccount { from, to } = self.route {
            if from == to {
                return Err(LedgerError::validation(
                    "source and destination account must differ",
                ));
            }
        }
        Ok(())
    }
}

impl RepayDebtInput {
    /// Validates the input.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)
    }
}

impl ContributeInput {
    /// Validates the input.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)
    }
}
