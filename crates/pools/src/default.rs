//! Default Pool - liquidated collateral and debt not yet applied to positions
//!
//! Holds the backing for the redistribution accumulator. Amounts move back to
//! the Active Pool when a position's pending rewards are applied.

use cdp_core::{Caller, ProtocolError, Role};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::balance::PoolBalance;

const NAME: &str = "DEFAULT_POOL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultPool {
    balance: PoolBalance,
}

impl DefaultPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> PoolBalance {
        self.balance
    }

    pub fn collateral(&self) -> Decimal {
        self.balance.collateral
    }

    pub fn debt(&self) -> Decimal {
        self.balance.debt
    }

    /// Only the Active Pool may send collateral here
    pub fn receive_collateral(&mut self, caller: &Caller, amount: Decimal) -> Result<(), ProtocolError> {
        caller.require(&[Role::ActivePool])?;
        self.balance.add_collateral(amount);
        Ok(())
    }

    /// Release collateral back to the Active Pool when rewards are applied.
    /// Returns the amount actually released.
    pub fn send_collateral_to_active(
        &mut self,
        caller: &Caller,
        amount: Decimal,
    ) -> Result<Decimal, ProtocolError> {
        caller.require(&[Role::LifecycleManager, Role::PositionOperations])?;
        // rounding in the accumulator can ask for a hair more than is held
        let amount = amount.min(self.balance.collateral);
        self.balance.sub_collateral(NAME, amount)?;
        Ok(amount)
    }

    pub fn increase_debt(&mut self, caller: &Caller, amount: Decimal) -> Result<(), ProtocolError> {
        caller.require(&[Role::LifecycleManager])?;
        self.balance.add_debt(amount);
        Ok(())
    }

    pub fn decrease_debt(&mut self, caller: &Caller, amount: Decimal) -> Result<(), ProtocolError> {
        caller.require(&[Role::LifecycleManager, Role::PositionOperations])?;
        self.balance.sub_debt(amount);
        Ok(())
    }
}
