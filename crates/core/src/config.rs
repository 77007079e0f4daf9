//! Protocol parameters
//!
//! Thresholds, floors and caps are configuration, not constants. Every field
//! has a serde default so a partial JSON file only overrides what it names.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::id::Owner;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolParams {
    // === Ratios ===
    /// Minimum collateral ratio; positions below it are liquidatable
    #[serde(default = "default_mcr")]
    pub mcr: Decimal,

    /// Critical system collateral ratio; below it the system is in Recovery Mode
    #[serde(default = "default_ccr")]
    pub ccr: Decimal,

    // === Debt floor ===
    /// Minimum debt excluding the gas compensation
    #[serde(default = "default_min_net_debt")]
    pub min_net_debt: Decimal,

    /// Bootstrap debt component reserved for the liquidator, never withdrawable
    #[serde(default = "default_gas_compensation")]
    pub gas_compensation: Decimal,

    // === Fees and penalties ===
    #[serde(default = "default_borrowing_fee_rate")]
    pub borrowing_fee_rate: Decimal,

    /// Share of redeemed collateral left in the position as the redemption fee
    #[serde(default = "default_redemption_fee_rate")]
    pub redemption_fee_rate: Decimal,

    /// Collateral premium over debt paid to the Stability Reserve on offset
    #[serde(default = "default_liquidation_penalty_sp")]
    pub liquidation_penalty_sp: Decimal,

    /// Collateral premium over debt redistributed to active positions
    #[serde(default = "default_liquidation_penalty_redistribution")]
    pub liquidation_penalty_redistribution: Decimal,

    // === Loop caps ===
    #[serde(default = "default_max_redemption_positions")]
    pub max_redemption_positions: usize,

    #[serde(default = "default_max_liquidation_batch")]
    pub max_liquidation_batch: usize,

    /// Account receiving borrowing fees
    #[serde(default = "default_treasury")]
    pub treasury: Owner,
}

fn default_mcr() -> Decimal {
    Decimal::new(110, 2)
}

fn default_ccr() -> Decimal {
    Decimal::new(150, 2)
}

fn default_min_net_debt() -> Decimal {
    Decimal::new(1_800, 0)
}

fn default_gas_compensation() -> Decimal {
    Decimal::new(200, 0)
}

fn default_borrowing_fee_rate() -> Decimal {
    Decimal::new(5, 3) // 0.5%
}

fn default_redemption_fee_rate() -> Decimal {
    Decimal::new(5, 3) // 0.5%
}

fn default_liquidation_penalty_sp() -> Decimal {
    Decimal::new(5, 2) // 5%
}

fn default_liquidation_penalty_redistribution() -> Decimal {
    Decimal::new(10, 2) // 10%
}

fn default_max_redemption_positions() -> usize {
    50
}

fn default_max_liquidation_batch() -> usize {
    100
}

fn default_treasury() -> Owner {
    Owner::treasury()
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            mcr: default_mcr(),
            ccr: default_ccr(),
            min_net_debt: default_min_net_debt(),
            gas_compensation: default_gas_compensation(),
            borrowing_fee_rate: default_borrowing_fee_rate(),
            redemption_fee_rate: default_redemption_fee_rate(),
            liquidation_penalty_sp: default_liquidation_penalty_sp(),
            liquidation_penalty_redistribution: default_liquidation_penalty_redistribution(),
            max_redemption_positions: default_max_redemption_positions(),
            max_liquidation_batch: default_max_liquidation_batch(),
            treasury: default_treasury(),
        }
    }
}

impl ProtocolParams {
    /// Load parameters from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Total debt recorded for a given net debt
    pub fn composite_debt(&self, net_debt: Decimal) -> Decimal {
        net_debt + self.gas_compensation
    }

    pub fn borrowing_fee(&self, debt: Decimal) -> Decimal {
        debt * self.borrowing_fee_rate
    }
}
