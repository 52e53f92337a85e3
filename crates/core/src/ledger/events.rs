//! Threshold events emitted after a committed mutation.
//!
//! The engine reports the new value of every balance it changed. Deciding
//! whether a threshold was crossed, and telling anyone about it, belongs to
//! the sink.

use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::OwnerId;
use uuid::Uuid;

/// Which kind of value changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdDomain {
    /// Account balance.
    AccountBalance,
    /// Budget remaining amount.
    BudgetRemaining,
    /// Goal progress.
    GoalProgress,
    /// Debt repayment tally.
    DebtRepaid,
}

/// A value that changed in a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThresholdEvent {
    /// Owner of the entity.
    pub owner_id: OwnerId,
    /// Kind of value.
    pub domain: ThresholdDomain,
    /// Id of the account, budget, goal or debt.
    pub entity_id: Uuid,
    /// Value after the commit.
    pub current_value: Decimal,
}

impl ThresholdEvent {
    /// Creates an event.
    #[must_use]
    pub fn new(
        owner_id: OwnerId,
        domain: ThresholdDomain,
        entity_id: impl Into<Uuid>,
        current_value: Decimal,
    ) -> Self {
        Self {
            owner_id,
            domain,
            entity_id: entity_id.into(),
            current_value,
        }
    }
}

/// Receives threshold events. Called only after commit, never inside a
/// transaction, so implementations must not assume they can still abort it.
pub trait ThresholdSink: Send + Sync {
    /// Handles one event. Must not block for long; the caller is waiting.
    fn notify(&self, event: &ThresholdEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopThresholdSink;

impl ThresholdSink for NoopThresholdSink {
    fn notify(&self, _event: &ThresholdEvent) {}
}

/// Events collected while an operation runs, published once it commits.
#[derive(Debug, Clone)]
pub struct PendingEvents {
    owner_id: OwnerId,
    events: Vec<ThresholdEvent>,
}

impl PendingEvents {
    /// Starts a batch for `owner_id`.
    #[must_use]
    pub fn for_owner(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            events: Vec::new(),
        }
    }

    /// Records a changed value.
    pub fn push(&mut self, domain: ThresholdDomain, entity_id: impl Into<Uuid>, value: Decimal) {
        self.events
            .push(ThresholdEvent::new(self.owner_id, domain, entity_id, value));
    }

    /// Hands every collected event to `sink`.
    pub fn publish(self, sink: &dyn ThresholdSink) {
        for event in &self.events {
            sink.notify(event);
        }
    }

    /// Collected events.
    #[must_use]
    pub fn events(&self) -> &[ThresholdEvent] {
        &self.events
    }
}
