//! Database migration runner for Tally.
//!
//! Usage:
//!   migrator up      - Apply pending migrations (creates the ledger tables)
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop everything and re-apply

use sea_orm_migration::prelude::*;
use tally_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Reads DATABASE_URL; sets up its own tracing.
    cli::run_cli(Migrator).await;
}
