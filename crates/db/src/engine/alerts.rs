//! Default threshold sink.

use rust_decimal::Decimal;
use tally_core::ledger::{ThresholdDomain, ThresholdEvent, ThresholdSink};
use tracing::{debug, warn};

/// Logs every event; values that fell below zero are logged as warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingThresholdSink;

impl TracingThresholdSink {
    /// Returns true if the event reports an overdrawn account or an
    /// overspent budget.
    #[must_use]
    pub fn is_breach(event: &ThresholdEvent) -> bool {
        matches!(
            event.domain,
            ThresholdDomain::AccountBalance | ThresholdDomain::BudgetRemaining
        ) && event.current_value < Decimal::ZERO
    }
}

impl ThresholdSink for TracingThresholdSink {
    fn notify(&self, event: &ThresholdEvent) {
        if Self::is_breach(event) {
            warn!(
                owner_id = %event.owner_id,
                domain = ?event.domain,
                entity_id = %event.entity_id,
                current_value = %event.current_value,
                "threshold breached"
            );
        } else {
            debug!(
                owner_id = %event.owner_id,
                domain = ?event.domain,
                entity_id = %event.entity_id,
                current_value = %event.current_value,
                "threshold value updated"
            );
        }
    }
}
