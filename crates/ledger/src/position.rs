//! Position records

use cdp_core::math::{collateral_ratio, nominal_ratio};
use cdp_core::{PositionId, PositionStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Accumulator values a position has already been credited up to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSnapshot {
    pub l_collateral: Decimal,
    pub l_debt: Decimal,
}

/// Redistributed amounts owed to a position but not yet applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRewards {
    pub collateral: Decimal,
    pub debt: Decimal,
}

impl PendingRewards {
    pub fn is_zero(&self) -> bool {
        self.collateral.is_zero() && self.debt.is_zero()
    }
}

/// A stored position
///
/// `debt` includes the gas compensation component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub collateral: Decimal,
    pub debt: Decimal,
    /// Part of `debt` paid into the Gas Pool at open
    #[serde(default)]
    pub gas_compensation: Decimal,
    pub stake: Decimal,
    pub snapshot: RewardSnapshot,
    pub status: PositionStatus,
}

impl Position {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Stored values plus pending rewards
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntirePosition {
    pub id: PositionId,
    pub collateral: Decimal,
    pub debt: Decimal,
    pub pending: PendingRewards,
}

impl EntirePosition {
    /// Individual collateral ratio at `price`
    pub fn collateral_ratio(&self, price: Decimal) -> Decimal {
        collateral_ratio(self.collateral, self.debt, price)
    }

    pub fn nominal_ratio(&self) -> Decimal {
        nominal_ratio(self.collateral, self.debt)
    }
}
