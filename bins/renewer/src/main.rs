//! Tally renewal sweep.
//!
//! Runs once and exits; schedule it daily. Marks overdue debts, then catches
//! up every auto-renewing subscription that is due. An optional first
//! argument (`YYYY-MM-DD`) overrides today's date.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::subscription::CatchUpHalt;
use tally_db::{LedgerEngine, connect};
use tally_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally_renewer=info,tally_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let today = match std::env::args().nth(1) {
        Some(arg) => NaiveDate::parse_from_str(&arg, "%Y-%m-%d")
            .with_context(|| format!("invalid date argument: {arg}"))?,
        None => Utc::now().date_naive(),
    };

    let db = connect(&config.database)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    let engine = LedgerEngine::with_tracing_sink(db, config.ledger.clone());

    let overdue = engine.mark_overdue_debts(today).await?;
    let reports = engine.renew_due_subscriptions(today).await?;

    let mut cycles = 0;
    let mut failed = 0;
    let mut behind = 0;
    for (subscription_id, report) in &reports {
        cycles += report.cycles;
        match report.halt {
            CatchUpHalt::Failed => {
                failed += 1;
                if let Some(err) = &report.stopped_by {
                    warn!(%subscription_id, error = %err, "renewal stopped");
                }
            }
            CatchUpHalt::CycleLimit => behind += 1,
            CatchUpHalt::UpToDate | CatchUpHalt::AutoRenewDisabled => {}
        }
    }

    info!(
        %today,
        overdue_debts = overdue,
        subscriptions = reports.len(),
        cycles,
        failed,
        still_behind = behind,
        "sweep complete"
    );
    Ok(())
}
