//! Catch-up driver for subscriptions that missed several renewals.
//!
//! The driver performs no I/O. For each cycle the storage layer locks the
//! subscription, hands the locked state to [`CatchUpDriver::check`], and
//! charges the cycle in that same transaction only if the driver agrees.
//! Overlapping runs therefore never charge a cycle twice. Cycles that
//! committed stay committed even if a later one fails.

use chrono::NaiveDate;

use super::RenewalOutcome;
use crate::ledger::LedgerError;

/// Default bound on cycles per invocation.
pub const DEFAULT_MAX_CATCH_UP_CYCLES: u32 = 12;

/// Why a catch-up run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchUpHalt {
    /// Next due date is in the future.
    UpToDate,
    /// Auto-renew is switched off.
    AutoRenewDisabled,
    /// The per-invocation cycle bound was reached.
    CycleLimit,
    /// A renewal cycle failed.
    Failed,
}

/// Result of one catch-up invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchUpReport {
    /// Renewal cycles committed by this invocation.
    pub cycles: u32,
    /// Next due date after the last committed cycle.
    pub next_due_date: NaiveDate,
    /// Why the run stopped.
    pub halt: CatchUpHalt,
    /// The failure that stopped the run, if any.
    pub stopped_by: Option<LedgerError>,
}

impl CatchUpReport {
    /// Returns true if the subscription is still overdue after this run.
    #[must_use]
    pub fn still_due(&self, today: NaiveDate) -> bool {
        self.next_due_date <= today
    }
}

/// Why a subscription in this state must not be renewed for `today`, or
/// `None` if a cycle is owed.
#[must_use]
pub fn due_halt(auto_renew: bool, next_due_date: NaiveDate, today: NaiveDate) -> Option<CatchUpHalt> {
    if !auto_renew {
        Some(CatchUpHalt::AutoRenewDisabled)
    } else if next_due_date > today {
        Some(CatchUpHalt::UpToDate)
    } else {
        None
    }
}

/// Result of a renewal attempt that first re-checks the locked row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewalCycle {
    /// A cycle was charged.
    Renewed(RenewalOutcome),
    /// Nothing was owed; nothing was charged.
    Halted(CatchUpHalt),
}

/// Loop state for one catch-up invocation.
#[derive(Debug, Clone)]
pub struct CatchUpDriver {
    max_cycles: u32,
    today: NaiveDate,
    cycles: u32,
    next_due_date: NaiveDate,
    stopped_by: Option<LedgerError>,
}

impl CatchUpDriver {
    /// Starts a run for a subscription currently due on `next_due_date`.
    #[must_use]
    pub fn new(max_cycles: u32, today: NaiveDate, next_due_date: NaiveDate) -> Self {
        Self {
            max_cycles,
            today,
            cycles: 0,
            next_due_date,
            stopped_by: None,
        }
    }

    /// Decides whether to run another cycle given the subscription's state,
    /// read under its row lock. Returns `Some(halt)` when the run should
    /// stop.
    pub fn check(&mut self, auto_renew: bool, next_due_date: NaiveDate) -> Option<CatchUpHalt> {
        self.next_due_date = next_due_date;
        due_halt(auto_renew, next_due_date, self.today).or_else(|| {
            (self.cycles >= self.max_cycles).then_some(CatchUpHalt::CycleLimit)
        })
    }

    /// Records a committed cycle.
    pub fn record_renewal(&mut self, next_due_date: NaiveDate) {
        self.cycles += 1;
        self.next_due_date = next_due_date;
    }

    /// Records the failure that ends the run.
    pub fn record_failure(&mut self, err: LedgerError) -> CatchUpHalt {
        self.stopped_by = Some(err);
        CatchUpHalt::Failed
    }

    /// Cycles committed so far.
    #[must_use]
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Builds the report.
    #[must_use]
    pub fn finish(self, halt: CatchUpHalt) -> CatchUpReport {
        CatchUpReport {
            cycles: self.cycles,
            next_due_date: self.next_due_date,
            halt,
            stopped_by: self.stopped_by,
        }
    }
}
