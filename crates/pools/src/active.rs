//! Active Pool - collateral and debt of all open positions

use cdp_core::{Caller, ProtocolError, Role};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::balance::PoolBalance;

const NAME: &str = "ACTIVE_POOL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivePool {
    balance: PoolBalance,
}

impl ActivePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure read of the pool totals
    pub fn balance(&self) -> PoolBalance {
        self.balance
    }

    pub fn collateral(&self) -> Decimal {
        self.balance.collateral
    }

    pub fn debt(&self) -> Decimal {
        self.balance.debt
    }

    /// Collateral arriving from a borrower or from the Default Pool
    pub fn receive_collateral(&mut self, caller: &Caller, amount: Decimal) -> Result<(), ProtocolError> {
        caller.require(&[Role::PositionOperations, Role::DefaultPool])?;
        self.balance.add_collateral(amount);
        Ok(())
    }

    /// Release collateral; the caller routes it to its destination
    pub fn send_collateral(&mut self, caller: &Caller, amount: Decimal) -> Result<(), ProtocolError> {
        caller.require(&[Role::PositionOperations, Role::LifecycleManager])?;
        self.balance.sub_collateral(NAME, amount)
    }

    pub fn increase_debt(&mut self, caller: &Caller, amount: Decimal) -> Result<(), ProtocolError> {
        caller.require(&[Role::PositionOperations, Role::LifecycleManager])?;
        self.balance.add_debt(amount);
        Ok(())
    }

    pub fn decrease_debt(&mut self, caller: &Caller, amount: Decimal) -> Result<(), ProtocolError> {
        caller.require(&[Role::PositionOperations, Role::LifecycleManager])?;
        self.balance.sub_debt(amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_core::Owner;
    use rust_decimal_macros::dec;

    fn ops() -> Caller {
        Caller::from(Role::PositionOperations)
    }

    #[test]
    fn test_receive_and_send_collateral() {
        let mut pool = ActivePool::new();
        pool.receive_collateral(&ops(), dec!(5)).unwrap();
        pool.send_collateral(&Caller::from(Role::LifecycleManager), dec!(2)).unwrap();
        assert_eq!(pool.collateral(), dec!(3));
    }

    #[test]
    fn test_send_more_than_held_fails() {
        let mut pool = ActivePool::new();
        pool.receive_collateral(&ops(), dec!(1)).unwrap();
        let result = pool.send_collateral(&ops(), dec!(1.5));
        assert!(matches!(result, Err(ProtocolError::InsufficientFunds { .. })));
        assert_eq!(pool.collateral(), dec!(1));
    }

    #[test]
    fn test_external_account_rejected() {
        let mut pool = ActivePool::new();
        let outsider = Caller::Account(Owner::new("eve").unwrap());

        assert!(matches!(
            pool.receive_collateral(&outsider, dec!(1)),
            Err(ProtocolError::NotAuthorized { .. })
        ));
        assert!(matches!(
            pool.increase_debt(&outsider, dec!(1)),
            Err(ProtocolError::NotAuthorized { .. })
        ));
        assert_eq!(pool.balance(), PoolBalance::default());
    }

    #[test]
    fn test_default_pool_may_return_collateral_but_not_borrow() {
        let mut pool = ActivePool::new();
        let default_pool = Caller::from(Role::DefaultPool);
        assert!(pool.receive_collateral(&default_pool, dec!(1)).is_ok());
        assert!(pool.increase_debt(&default_pool, dec!(1)).is_err());
    }

    #[test]
    fn test_balance_read_is_idempotent() {
        let mut pool = ActivePool::new();
        pool.increase_debt(&ops(), dec!(180)).unwrap();
        let first = pool.balance();
        let second = pool.balance();
        assert_eq!(first, second);
        assert_eq!(first.debt, dec!(180));
    }
}
