//! Shared setup for lifecycle integration tests
//!
//! Positions are created by calling the components directly as
//! `Role::PositionOperations`, the same transfers the operations crate makes.

#![allow(dead_code)]

use cdp_core::{Caller, Owner, PositionId, ProtocolParams, Role};
use cdp_lifecycle::ProtocolState;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const PRICE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// No gas compensation and a small debt floor so hand-sized numbers work
pub fn params() -> ProtocolParams {
    ProtocolParams {
        gas_compensation: Decimal::ZERO,
        min_net_debt: dec!(100),
        ..ProtocolParams::default()
    }
}

pub fn owner(name: &str) -> Owner {
    Owner::new(name).unwrap()
}

fn ops() -> Caller {
    Caller::from(Role::PositionOperations)
}

/// Open a position funded from outside
///
/// The current gas compensation goes to the Gas Pool and the owner receives
/// the rest of `debt` in stable.
pub fn open(state: &mut ProtocolState, name: &str, collateral: Decimal, debt: Decimal) -> PositionId {
    let who = owner(name);
    let id = PositionId::new(who.clone(), state.ledger.next_index(&who));
    let gas = state.params.gas_compensation;

    state.wallets.fund_collateral(&who, collateral);
    state.wallets.pull_collateral(&who, collateral).unwrap();
    state.active.receive_collateral(&ops(), collateral).unwrap();
    state.active.increase_debt(&ops(), debt).unwrap();
    state.ledger.open(&ops(), &id, collateral, debt, gas).unwrap();
    state.wallets.mint_stable(&who, debt - gas);
    state.gas.deposit(&ops(), gas).unwrap();
    id
}

/// Move `amount` of the depositor's stable into the Stability Reserve
pub fn deposit(state: &mut ProtocolState, name: &str, amount: Decimal) {
    let who = owner(name);
    state.wallets.burn_stable(&who, amount).unwrap();
    state.reserve.provide(&ops(), &who, amount).unwrap();
}

/// Collateral in every bucket the protocol can hold it in
pub fn total_collateral_everywhere(state: &ProtocolState) -> Decimal {
    state.active.collateral()
        + state.default.collateral()
        + state.escrow.collateral_balance()
        + state.reserve.collateral_balance()
        + state.wallets.total_collateral()
}

pub fn assert_stable_conserved(state: &ProtocolState) {
    let held = state.wallets.total_stable() + state.reserve.total_deposits() + state.gas.balance();
    let owed = state.active.debt() + state.default.debt();
    assert_eq!(held, owed, "stable held {} != debt {}", held, owed);
}

/// Stored active positions match the Active Pool; Default Pool covers pending rewards
pub fn assert_pools_match_ledger(state: &ProtocolState) {
    let (collateral, debt) = state.ledger.active_totals();
    assert_eq!(collateral, state.active.collateral());
    assert_eq!(debt, state.active.debt());

    let pending: Vec<_> = state
        .ledger
        .iter_ascending()
        .map(|id| state.ledger.pending_rewards(id))
        .collect();
    let pending_collateral: Decimal = pending.iter().map(|p| p.collateral).sum();
    let pending_debt: Decimal = pending.iter().map(|p| p.debt).sum();
    assert!(pending_collateral <= state.default.collateral());
    assert!(pending_debt <= state.default.debt());
    assert!(state.default.collateral() - pending_collateral < dec!(0.000000001));
    assert!(state.default.debt() - pending_debt < dec!(0.000000001));
}
