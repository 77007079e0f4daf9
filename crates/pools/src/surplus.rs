//! Surplus Escrow - collateral owed to owners of closed positions
//!
//! Liquidations and full redemptions can leave collateral behind after the
//! debt is settled. It is credited here per owner and paid out exactly once
//! through the claim path of Position Operations.

use cdp_core::{Caller, Owner, ProtocolError, Role};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurplusEscrow {
    balances: BTreeMap<Owner, Decimal>,
    collateral: Decimal,
}

impl SurplusEscrow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claimable amount for an owner, zero when nothing is owed
    pub fn balance_of(&self, owner: &Owner) -> Decimal {
        self.balances.get(owner).copied().unwrap_or(Decimal::ZERO)
    }

    /// Collateral physically held; always equals the sum of claimable balances
    pub fn collateral_balance(&self) -> Decimal {
        self.collateral
    }

    /// Record a surplus for `owner`. Repeated credits accumulate.
    pub fn credit(&mut self, caller: &Caller, owner: &Owner, amount: Decimal) -> Result<Decimal, ProtocolError> {
        caller.require(&[Role::LifecycleManager])?;
        if amount.is_sign_negative() {
            return Err(ProtocolError::invalid_amount("surplus", "must not be negative"));
        }
        if amount.is_zero() {
            return Ok(self.balance_of(owner));
        }

        let balance = self.balances.entry(owner.clone()).or_insert(Decimal::ZERO);
        *balance += amount;
        tracing::debug!(owner = %owner, amount = %amount, balance = %balance, "Surplus credited");
        Ok(*balance)
    }

    /// Collateral arriving from the Active Pool to back credited balances
    pub fn receive_collateral(&mut self, caller: &Caller, amount: Decimal) -> Result<(), ProtocolError> {
        caller.require(&[Role::ActivePool])?;
        self.collateral += amount;
        Ok(())
    }

    /// Zero the owner's balance and return the amount to pay out
    pub fn claim(&mut self, caller: &Caller, owner: &Owner) -> Result<Decimal, ProtocolError> {
        caller.require(&[Role::PositionOperations])?;

        let amount = match self.balances.get(owner) {
            Some(amount) if !amount.is_zero() => *amount,
            _ => return Err(ProtocolError::NothingToClaim(owner.to_string())),
        };
        if amount > self.collateral {
            return Err(ProtocolError::InsufficientFunds {
                account: "SURPLUS_ESCROW".to_string(),
                asset: "collateral",
                available: self.collateral,
                required: amount,
            });
        }

        self.balances.remove(owner);
        self.collateral -= amount;
        tracing::debug!(owner = %owner, amount = %amount, "Surplus claimed");
        Ok(amount)
    }

    /// Total of all claimable balances
    pub fn total_owed(&self) -> Decimal {
        self.balances.values().copied().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Owner, &Decimal)> {
        self.balances.iter()
    }
}
