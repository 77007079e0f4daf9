//! Redistribution accumulator
//!
//! Liquidated debt and collateral that the Stability Reserve could not absorb
//! are shared across active positions in proportion to stake. Instead of
//! touching every position, the ledger raises `L_collateral` and `L_debt`
//! (reward per unit of stake) and each position settles lazily against its
//! snapshot.

use cdp_core::ProtocolError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::position::{PendingRewards, RewardSnapshot};

const PRECISION_DP: u32 = 18;

fn round_down(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRECISION_DP, RoundingStrategy::ToZero)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAccumulator {
    pub l_collateral: Decimal,
    pub l_debt: Decimal,
    pub total_stakes: Decimal,
    /// `total_stakes` as of the last liquidation
    pub total_stakes_snapshot: Decimal,
    /// System collateral as of the last liquidation
    pub total_collateral_snapshot: Decimal,
    last_collateral_error: Decimal,
    last_debt_error: Decimal,
}

impl RewardAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stake for a position holding `collateral`
    ///
    /// Scaled by the snapshot ratio so that positions opened after a
    /// redistribution do not share in rewards they were not exposed to.
    pub fn compute_stake(&self, collateral: Decimal) -> Decimal {
        if self.total_collateral_snapshot.is_zero() || self.total_stakes_snapshot.is_zero() {
            collateral
        } else {
            round_down(collateral * self.total_stakes_snapshot / self.total_collateral_snapshot)
        }
    }

    pub fn current_snapshot(&self) -> RewardSnapshot {
        RewardSnapshot {
            l_collateral: self.l_collateral,
            l_debt: self.l_debt,
        }
    }

    /// Rewards accrued by `stake` since `snapshot`
    pub fn pending(&self, stake: Decimal, snapshot: &RewardSnapshot) -> PendingRewards {
        PendingRewards {
            collateral: round_down(stake * (self.l_collateral - snapshot.l_collateral)),
            debt: round_down(stake * (self.l_debt - snapshot.l_debt)),
        }
    }

    pub(crate) fn add_stake(&mut self, stake: Decimal) {
        self.total_stakes += stake;
    }

    pub(crate) fn remove_stake(&mut self, stake: Decimal) {
        self.total_stakes = (self.total_stakes - stake).max(Decimal::ZERO);
    }

    /// Raise the per-stake accumulators by `debt` and `collateral`
    ///
    /// Rewards per stake are rounded down and the remainder is fed into the
    /// next distribution, so the sum of pending rewards never exceeds what
    /// the Default Pool holds.
    pub fn distribute(&mut self, debt: Decimal, collateral: Decimal) -> Result<(), ProtocolError> {
        if debt.is_zero() && collateral.is_zero() {
            return Ok(());
        }
        if self.total_stakes.is_zero() {
            return Err(ProtocolError::NoRedistributionTarget);
        }

        let collateral_numerator = collateral + self.last_collateral_error;
        let debt_numerator = debt + self.last_debt_error;

        let collateral_per_stake = round_down(collateral_numerator / self.total_stakes);
        let debt_per_stake = round_down(debt_numerator / self.total_stakes);

        self.last_collateral_error = collateral_numerator - collateral_per_stake * self.total_stakes;
        self.last_debt_error = debt_numerator - debt_per_stake * self.total_stakes;

        self.l_collateral += collateral_per_stake;
        self.l_debt += debt_per_stake;
        Ok(())
    }

    /// Record stakes and system collateral after a liquidation
    ///
    /// With no stake left the snapshots are cleared, so the next position
    /// starts again at stake = collateral.
    pub fn update_system_snapshots(&mut self, total_collateral: Decimal) {
        if self.total_stakes.is_zero() {
            self.total_stakes_snapshot = Decimal::ZERO;
            self.total_collateral_snapshot = Decimal::ZERO;
        } else {
            self.total_stakes_snapshot = self.total_stakes;
            self.total_collateral_snapshot = total_collateral;
        }
    }

    /// Hand Default Pool contents that no stake can claim to the next
    /// distribution
    ///
    /// Only meaningful while `total_stakes` is zero: nothing is pending then,
    /// so the whole pool is unowned rounding remainder.
    pub fn carry_unowned(&mut self, debt: Decimal, collateral: Decimal) {
        if self.total_stakes.is_zero() {
            self.last_debt_error = debt;
            self.last_collateral_error = collateral;
        }
    }
}
