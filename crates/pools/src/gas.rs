//! Gas Pool - stable asset backing every position's gas compensation

use cdp_core::{Caller, ProtocolError, Role};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GasPool {
    stable: Decimal,
}

impl GasPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> Decimal {
        self.stable
    }

    /// Gas compensation minted when a position opens
    pub fn deposit(&mut self, caller: &Caller, amount: Decimal) -> Result<(), ProtocolError> {
        caller.require(&[Role::PositionOperations])?;
        self.stable += amount;
        Ok(())
    }

    /// Released to a liquidator or burned when a position closes
    pub fn withdraw(&mut self, caller: &Caller, amount: Decimal) -> Result<(), ProtocolError> {
        caller.require(&[Role::PositionOperations, Role::LifecycleManager])?;
        if amount > self.stable {
            return Err(ProtocolError::InsufficientFunds {
                account: "GAS_POOL".to_string(),
                asset: "stable",
                available: self.stable,
                required: amount,
            });
        }
        self.stable -= amount;
        Ok(())
    }
}
