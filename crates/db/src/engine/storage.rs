//! Mapping from `SeaORM` errors to ledger errors.
//!
//! Driver details never leave this module: they are logged here and the
//! caller sees either `LockTimeout` or the opaque `StorageFailure`.

use sea_orm::{DbErr, RuntimeErr};
use tally_core::ledger::LedgerError;
use tracing::{error, warn};

/// `lock_not_available`: raised when `lock_timeout` expires.
pub(crate) const LOCK_NOT_AVAILABLE: &str = "55P03";
/// `deadlock_detected`.
pub(crate) const DEADLOCK_DETECTED: &str = "40P01";

/// Returns the `PostgreSQL` SQLSTATE carried by `err`, if any.
fn sqlstate(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Conn(RuntimeErr::SqlxError(e))
        | DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e)) => driver_sqlstate(e),
        _ => None,
    }
}

fn driver_sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code.into_owned())
}

/// Maps an SQLSTATE to the ledger error it represents.
pub(crate) fn classify_sqlstate(code: Option<&str>) -> LedgerError {
    match code {
        Some(LOCK_NOT_AVAILABLE | DEADLOCK_DETECTED) => LedgerError::LockTimeout,
        _ => LedgerError::StorageFailure,
    }
}

/// Converts a `SeaORM` error, logging what the caller will not see.
pub(crate) fn map_db_err(err: &DbErr) -> LedgerError {
    let code = sqlstate(err);
    let mapped = classify_sqlstate(code.as_deref());
    if mapped == LedgerError::LockTimeout {
        warn!(sqlstate = ?code, "row lock not acquired in time");
    } else {
        error!(error = %err, sqlstate = ?code, "storage operation failed");
    }
    mapped
}

/// Extension trait for turning `SeaORM` results into ledger results.
pub(crate) trait StorageResultExt<T> {
    /// Maps the error side through [`map_db_err`].
    fn storage(self) -> Result<T, LedgerError>;
}

impl<T> StorageResultExt<T> for Result<T, DbErr> {
    fn storage(self) -> Result<T, LedgerError> {
        self.map_err(|err| map_db_err(&err))
    }
}

/// Logs a failed operation at a level matching its cause.
pub(crate) fn log_failure(operation: &'static str, err: &LedgerError) {
    match err {
        // Already logged with driver detail by `map_db_err`.
        LedgerError::StorageFailure => {}
        LedgerError::LockTimeout => warn!(operation, "operation timed out waiting for locks"),
        LedgerError::Validation(_) => {
            warn!(operation, error = %err, code = err.error_code(), "operation input rejected");
        }
        _ => warn!(operation, error = %err, code = err.error_code(), "operation rejected"),
    }
}
