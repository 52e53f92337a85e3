//! Explicit policy switches for behaviour that used to be implicit.

use tally_shared::LedgerConfig;

use super::types::FundsCheck;

/// Policy decisions the engine applies to goal funding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Reject goal credits (contributions, account→goal transfers) that would
    /// take `current` past `target`.
    pub cap_goal_contributions: bool,
    /// Require the funding account to cover a contribution.
    pub require_funds_for_contributions: bool,
}

impl LedgerPolicy {
    /// Funds check applied when a contribution debits its funding account.
    #[must_use]
    pub fn contribution_funds_check(&self) -> FundsCheck {
        if self.require_funds_for_contributions {
            FundsCheck::Required
        } else {
            FundsCheck::Unchecked
        }
    }
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for LedgerPolicy {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            cap_goal_contributions: config.cap_goal_contributions,
            require_funds_for_contributions: config.require_funds_for_contributions,
        }
    }
}
