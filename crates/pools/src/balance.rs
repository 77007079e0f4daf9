//! Collateral/debt pair held by a pool

use cdp_core::ProtocolError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBalance {
    pub collateral: Decimal,
    pub debt: Decimal,
}

impl PoolBalance {
    pub(crate) fn add_collateral(&mut self, amount: Decimal) {
        self.collateral += amount;
    }

    pub(crate) fn sub_collateral(&mut self, pool: &str, amount: Decimal) -> Result<(), ProtocolError> {
        if amount > self.collateral {
            return Err(ProtocolError::InsufficientFunds {
                account: pool.to_string(),
                asset: "collateral",
                available: self.collateral,
                required: amount,
            });
        }
        self.collateral -= amount;
        Ok(())
    }

    pub(crate) fn add_debt(&mut self, amount: Decimal) {
        self.debt += amount;
    }

    /// Debt may be reduced by slightly more than recorded due to rounding in
    /// the reward accumulators; the pool clamps at zero rather than failing.
    pub(crate) fn sub_debt(&mut self, amount: Decimal) {
        self.debt = (self.debt - amount).max(Decimal::ZERO);
    }
}
