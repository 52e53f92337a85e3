//! Database layer with `SeaORM` entities, migrations and the ledger engine.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Database migrations
//! - [`LedgerEngine`], the atomic multi-entity money operations

pub mod engine;
pub mod entities;
pub mod migration;

pub use engine::{LedgerEngine, TracingThresholdSink};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tally_shared::DatabaseConfig;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
