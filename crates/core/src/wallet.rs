//! External account balances
//!
//! Stand-in for the asset transfer service: every call either fully succeeds
//! or fails with `InsufficientFunds` and leaves balances untouched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ProtocolError;
use crate::id::Owner;

/// Collateral and stable-asset holdings of one external account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub collateral: Decimal,
    pub stable: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wallets {
    accounts: BTreeMap<Owner, WalletBalance>,
}

impl Wallets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure read; unknown accounts hold nothing
    pub fn balance(&self, owner: &Owner) -> WalletBalance {
        self.accounts.get(owner).copied().unwrap_or_default()
    }

    /// Collateral entering the system from outside (faucet / bridge deposit)
    pub fn fund_collateral(&mut self, owner: &Owner, amount: Decimal) {
        self.accounts.entry(owner.clone()).or_default().collateral += amount;
    }

    /// Move collateral from the account into the protocol
    pub fn pull_collateral(&mut self, owner: &Owner, amount: Decimal) -> Result<(), ProtocolError> {
        let available = self.balance(owner).collateral;
        if available < amount {
            return Err(ProtocolError::InsufficientFunds {
                account: owner.to_string(),
                asset: "collateral",
                available,
                required: amount,
            });
        }
        self.accounts.entry(owner.clone()).or_default().collateral -= amount;
        Ok(())
    }

    /// Move collateral from the protocol to the account
    pub fn push_collateral(&mut self, owner: &Owner, amount: Decimal) {
        if amount.is_zero() {
            return;
        }
        self.accounts.entry(owner.clone()).or_default().collateral += amount;
    }

    pub fn mint_stable(&mut self, owner: &Owner, amount: Decimal) {
        if amount.is_zero() {
            return;
        }
        self.accounts.entry(owner.clone()).or_default().stable += amount;
    }

    pub fn burn_stable(&mut self, owner: &Owner, amount: Decimal) -> Result<(), ProtocolError> {
        self.require_stable(owner, amount)?;
        if let Some(balance) = self.accounts.get_mut(owner) {
            balance.stable -= amount;
        }
        Ok(())
    }

    /// Move stable asset between two accounts
    pub fn transfer_stable(&mut self, from: &Owner, to: &Owner, amount: Decimal) -> Result<(), ProtocolError> {
        self.burn_stable(from, amount)?;
        self.mint_stable(to, amount);
        Ok(())
    }

    pub fn require_stable(&self, owner: &Owner, amount: Decimal) -> Result<(), ProtocolError> {
        let available = self.balance(owner).stable;
        if available < amount {
            return Err(ProtocolError::InsufficientFunds {
                account: owner.to_string(),
                asset: "stable",
                available,
                required: amount,
            });
        }
        Ok(())
    }

    pub fn total_collateral(&self) -> Decimal {
        self.accounts.values().map(|b| b.collateral).sum()
    }

    pub fn total_stable(&self) -> Decimal {
        self.accounts.values().map(|b| b.stable).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Owner, &WalletBalance)> {
        self.accounts.iter()
    }
}
