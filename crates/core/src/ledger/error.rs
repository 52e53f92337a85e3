//! Ledger error types.
//!
//! Every operation of the ledger engine fails with exactly one of these
//! variants. Business-rule errors carry enough context (entity, required vs.
//! available amount) for a caller to render an actionable message; storage
//! errors are deliberately opaque.

use std::fmt;

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::{
    AccountId, BudgetId, DebtId, ExpenseId, GoalId, RevenueId, SubscriptionId,
};
use thiserror::Error;
use uuid::Uuid;

/// Reference to a ledger entity, used in error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    /// A money account.
    Account(AccountId),
    /// A savings goal.
    Goal(GoalId),
    /// A debt.
    Debt(DebtId),
    /// A monthly category budget.
    Budget(BudgetId),
    /// A recurring subscription.
    Subscription(SubscriptionId),
    /// An expense record.
    Expense(ExpenseId),
    /// A revenue record.
    Revenue(RevenueId),
}

impl EntityRef {
    /// Raw id of the entity.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Account(id) => id.0,
            Self::Goal(id) => id.0,
            Self::Debt(id) => id.0,
            Self::Budget(id) => id.0,
            Self::Subscription(id) => id.0,
            Self::Expense(id) => id.0,
            Self::Revenue(id) => id.0,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(id) => write!(f, "account {id}"),
            Self::Goal(id) => write!(f, "goal {id}"),
            Self::Debt(id) => write!(f, "debt {id}"),
            Self::Budget(id) => write!(f, "budget {id}"),
            Self::Subscription(id) => write!(f, "subscription {id}"),
            Self::Expense(id) => write!(f, "expense {id}"),
            Self::Revenue(id) => write!(f, "revenue {id}"),
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Input rejected before any lock was taken.
    #[error("Validation failed: {0}")]
    Validation(String),

    // ========== Business Rule Errors ==========
    /// The source of funds cannot cover the requested amount.
    #[error("Insufficient funds in {entity}: required {required}, available {available}")]
    InsufficientFunds {
        /// Entity that was short.
        entity: EntityRef,
        /// Amount the operation needed from it.
        required: Decimal,
        /// Amount it actually held.
        available: Decimal,
    },

    /// The operation would push a capped value past its cap.
    #[error("Cap exceeded on {entity}: cap {cap}, attempted {attempted}")]
    CapExceeded {
        /// Entity whose cap would be exceeded.
        entity: EntityRef,
        /// The cap.
        cap: Decimal,
        /// The value the operation would have produced.
        attempted: Decimal,
    },

    /// Entity does not exist or is not visible to the caller.
    #[error("Not found: {0}")]
    NotFound(EntityRef),

    /// Subscription is inactive and cannot be renewed.
    #[error("Subscription {0} is inactive")]
    Inactive(SubscriptionId),

    /// Subscription has no account to charge.
    #[error("Subscription {0} has no linked account")]
    NoLinkedAccount(SubscriptionId),

    // ========== Concurrency Errors ==========
    /// A row lock could not be acquired within the configured wait.
    #[error("Timed out waiting for a row lock, please retry")]
    LockTimeout,

    // ========== Storage Errors ==========
    /// Any lower-level storage failure. Details are logged, not exposed.
    #[error("Storage operation failed")]
    StorageFailure,
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::CapExceeded { .. } => "CAP_EXCEEDED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Inactive(_) => "SUBSCRIPTION_INACTIVE",
            Self::NoLinkedAccount(_) => "NO_LINKED_ACCOUNT",
            Self::LockTimeout => "LOCK_TIMEOUT",
            Self::StorageFailure => "STORAGE_FAILURE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::Validation(_) => 400,

            // 404 Not Found
            Self::NotFound(_) => 404,

            // 409 Conflict - lock contention
            Self::LockTimeout => 409,

            // 422 Unprocessable - business rules
            Self::InsufficientFunds { .. }
            | Self::CapExceeded { .. }
            | Self::Inactive(_)
            | Self::NoLinkedAccount(_) => 422,

            // 500 Internal Server Error
            Self::StorageFailure => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout)
    }

    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::Validation(_) => Self::Validation(message),
            LedgerError::NotFound(_) => Self::NotFound(message),
            LedgerError::InsufficientFunds { .. }
            | LedgerError::CapExceeded { .. }
            | LedgerError::Inactive(_)
            | LedgerError::NoLinkedAccount(_) => Self::BusinessRule(message),
            LedgerError::LockTimeout => Self::Conflict(message),
            LedgerError::StorageFailure => Self::Database(message),
        }
    }
}
