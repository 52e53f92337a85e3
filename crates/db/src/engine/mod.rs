//! The ledger consistency engine.
//!
//! Every public operation follows the same shape: validate the input, begin
//! a transaction with a bounded lock wait, lock every row it will touch in
//! the global order, compute new values with the `tally_core` rules, write
//! them together with an append-only record, commit, and only then report
//! changed values to the threshold sink. Any error before commit drops the
//! transaction, which rolls it back.

mod alerts;
mod balance;
mod contribution;
mod debt;
mod expense;
mod locking;
mod revenue;
mod storage;
mod subscription;
mod transfer;

use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tally_core::ledger::{LedgerError, LedgerPolicy, PendingEvents, ThresholdSink};
use tally_shared::LedgerConfig;

pub use alerts::TracingThresholdSink;

use storage::StorageResultExt;

/// Atomic multi-entity money operations over a `PostgreSQL` ledger.
///
/// Cheap to clone; clones share the connection pool and the sink.
#[derive(Clone)]
pub struct LedgerEngine {
    db: DatabaseConnection,
    config: LedgerConfig,
    policy: LedgerPolicy,
    sink: Arc<dyn ThresholdSink>,
}

impl std::fmt::Debug for LedgerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEngine")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl LedgerEngine {
    /// Creates an engine over `db`, reporting changed values to `sink`.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: LedgerConfig, sink: Arc<dyn ThresholdSink>) -> Self {
        let policy = LedgerPolicy::from(&config);
        Self {
            db,
            config,
            policy,
            sink,
        }
    }

    /// Creates an engine that logs threshold events through `tracing`.
    #[must_use]
    pub fn with_tracing_sink(db: DatabaseConnection, config: LedgerConfig) -> Self {
        Self::new(db, config, Arc::new(TracingThresholdSink))
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Goal funding policy derived from the configuration.
    #[must_use]
    pub fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    /// Begins a transaction whose lock waits give up after the configured
    /// timeout.
    async fn begin(&self) -> Result<DatabaseTransaction, LedgerError> {
        let txn = self.db.begin().await.storage()?;
        txn.execute_unprepared(&lock_timeout_sql(self.config.lock_timeout_ms))
            .await
            .storage()?;
        Ok(txn)
    }

    /// Commits `txn` and then hands `events` to the sink.
    async fn commit(&self, txn: DatabaseTransaction, events: PendingEvents) -> Result<(), LedgerError> {
        txn.commit().await.storage()?;
        events.publish(self.sink.as_ref());
        Ok(())
    }
}

/// `SET LOCAL` statement bounding row lock waits for the current transaction.
fn lock_timeout_sql(timeout_ms: u64) -> String {
    format!("SET LOCAL lock_timeout = '{timeout_ms}ms'")
}
