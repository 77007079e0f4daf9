mod common;

use cdp_core::{PositionId, PositionStatus, ProtocolError, ProtocolEvent};
use cdp_lifecycle::{LifecycleManager, ProtocolState};
use common::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// A large healthy position for WHALE plus CAROL's at the given collateral
/// against 180 debt
fn setup(carol_collateral: Decimal) -> (ProtocolState, PositionId) {
    let mut state = ProtocolState::new(params());
    open(&mut state, "whale", dec!(100), dec!(2000));
    let carol = open(&mut state, "carol", carol_collateral, dec!(180));
    (state, carol)
}

#[test]
fn test_position_at_111_percent_is_not_liquidated() {
    let (mut state, carol) = setup(dec!(2.0));
    let manager = LifecycleManager::new();

    let result = manager.liquidate(&mut state, &owner("keeper"), &carol, PRICE);
    assert!(matches!(result, Err(ProtocolError::NothingToLiquidate)));
    assert_eq!(state.ledger.status(&carol), PositionStatus::Active);
    assert!(state.pending_events().is_empty());
}

#[test]
fn test_full_offset_with_sufficient_reserve() {
    let (mut state, carol) = setup(dec!(1.9));
    deposit(&mut state, "whale", dec!(1000));
    let before = total_collateral_everywhere(&state);
    let manager = LifecycleManager::new();

    let summary = manager
        .liquidate(&mut state, &owner("keeper"), &carol, PRICE)
        .unwrap();

    assert_eq!(summary.count(), 1);
    assert_eq!(summary.debt_offset, dec!(180));
    assert!(summary.debt_redistributed.is_zero());
    assert_eq!(state.ledger.status(&carol), PositionStatus::ClosedByLiquidation);

    // depositors absorb the debt and receive the capped collateral
    assert_eq!(state.reserve.total_deposits(), dec!(820));
    assert_eq!(state.reserve.compounded_deposit(&owner("whale")), dec!(820));
    assert_eq!(state.reserve.collateral_gain(&owner("whale")), dec!(1.89));

    // what is left over is escrowed for the owner
    assert_eq!(state.escrow.balance_of(&owner("carol")), dec!(0.01));
    assert_eq!(state.escrow.collateral_balance(), dec!(0.01));

    assert!(state.default.debt().is_zero());
    assert_eq!(total_collateral_everywhere(&state), before);
    assert_stable_conserved(&state);
    assert_pools_match_ledger(&state);
}

#[test]
fn test_full_redistribution_with_empty_reserve() {
    let (mut state, carol) = setup(dec!(1.9));
    let whale = PositionId::new(owner("whale"), 0);
    let manager = LifecycleManager::new();

    let summary = manager
        .liquidate(&mut state, &owner("keeper"), &carol, PRICE)
        .unwrap();

    assert!(summary.debt_offset.is_zero());
    assert_eq!(summary.debt_redistributed, dec!(180));
    assert_eq!(summary.collateral_redistributed, dec!(1.9));
    assert!(summary.surplus.is_zero());

    assert_eq!(state.default.debt(), dec!(180));
    assert_eq!(state.default.collateral(), dec!(1.9));
    assert!(state.escrow.balance_of(&owner("carol")).is_zero());

    let entire = state.ledger.entire_position(&whale).unwrap();
    assert_eq!(entire.debt, dec!(2180));
    assert_eq!(entire.collateral, dec!(101.9));

    assert_stable_conserved(&state);
    assert_pools_match_ledger(&state);
}

#[test]
fn test_redistribution_needs_a_remaining_position() {
    let mut state = ProtocolState::new(params());
    let carol = open(&mut state, "carol", dec!(1.9), dec!(180));
    let manager = LifecycleManager::new();

    let result = manager.liquidate(&mut state, &owner("keeper"), &carol, PRICE);
    assert!(matches!(result, Err(ProtocolError::NoRedistributionTarget)));
    assert_eq!(state.ledger.status(&carol), PositionStatus::Active);
    assert_eq!(state.active.debt(), dec!(180));
}

#[test]
fn test_liquidate_closed_position_fails() {
    let (mut state, carol) = setup(dec!(1.9));
    let manager = LifecycleManager::new();
    manager.liquidate(&mut state, &owner("keeper"), &carol, PRICE).unwrap();

    let again = manager.liquidate(&mut state, &owner("keeper"), &carol, PRICE);
    assert!(matches!(again, Err(ProtocolError::NotActive(_))));
}

#[test]
fn test_scan_stops_at_first_healthy_position() {
    let mut state = ProtocolState::new(params());
    open(&mut state, "whale", dec!(100), dec!(2000));
    let a = open(&mut state, "alice", dec!(1.9), dec!(180));
    let b = open(&mut state, "bob", dec!(1.95), dec!(180));
    let healthy = open(&mut state, "dave", dec!(2.5), dec!(180));
    deposit(&mut state, "whale", dec!(1000));
    let manager = LifecycleManager::new();

    let summary = manager
        .liquidate_positions(&mut state, &owner("keeper"), 10, PRICE)
        .unwrap();

    assert_eq!(summary.count(), 2);
    assert_eq!(summary.debt_offset, dec!(360));
    assert_eq!(state.ledger.status(&a), PositionStatus::ClosedByLiquidation);
    assert_eq!(state.ledger.status(&b), PositionStatus::ClosedByLiquidation);
    assert_eq!(state.ledger.status(&healthy), PositionStatus::Active);

    // one offset for the whole batch
    let offsets = state
        .pending_events()
        .iter()
        .filter(|e| matches!(e, ProtocolEvent::ReserveOffset { .. }))
        .count();
    assert_eq!(offsets, 1);
    assert_stable_conserved(&state);
    assert_pools_match_ledger(&state);
}

#[test]
fn test_batch_splits_between_offset_and_redistribution() {
    let mut state = ProtocolState::new(params());
    open(&mut state, "whale", dec!(100), dec!(2000));
    let a = open(&mut state, "alice", dec!(1.9), dec!(180));
    let b = open(&mut state, "bob", dec!(1.9), dec!(180));
    deposit(&mut state, "whale", dec!(200));
    let before = total_collateral_everywhere(&state);
    let manager = LifecycleManager::new();

    let summary = manager
        .batch_liquidate(&mut state, &owner("keeper"), &[a.clone(), b.clone()], PRICE)
        .unwrap();

    // the reserve covers the first position and 20 of the second
    assert_eq!(summary.debt_offset, dec!(200));
    assert_eq!(summary.debt_redistributed, dec!(160));
    assert!(state.reserve.total_deposits().is_zero());
    assert_eq!(state.default.debt(), dec!(160));

    assert_eq!(total_collateral_everywhere(&state), before);
    assert_stable_conserved(&state);
    assert_pools_match_ledger(&state);
}

#[test]
fn test_batch_skips_healthy_and_unknown_ids() {
    let (mut state, carol) = setup(dec!(1.9));
    let manager = LifecycleManager::new();
    let unknown = PositionId::new(owner("nobody"), 7);
    let whale = PositionId::new(owner("whale"), 0);

    let summary = manager
        .batch_liquidate(
            &mut state,
            &owner("keeper"),
            &[unknown, whale.clone(), carol.clone(), carol.clone()],
            PRICE,
        )
        .unwrap();

    assert_eq!(summary.count(), 1);
    assert_eq!(state.ledger.status(&whale), PositionStatus::Active);
}

#[test]
fn test_recovery_mode_liquidates_above_mcr() {
    let mut state = ProtocolState::new(params());
    let p1 = open(&mut state, "alice", dec!(2.6), dec!(200));
    let p2 = open(&mut state, "bob", dec!(2.8), dec!(200));
    deposit(&mut state, "alice", dec!(200));
    assert!(state.is_recovery_mode(PRICE));
    let manager = LifecycleManager::new();

    let summary = manager
        .batch_liquidate(&mut state, &owner("keeper"), &[p1.clone(), p2.clone()], PRICE)
        .unwrap();

    // P1 at 130% is below TCR 135%; afterwards TCR is 140% and P2 no longer qualifies
    assert_eq!(summary.count(), 1);
    assert_eq!(state.ledger.status(&p1), PositionStatus::ClosedByLiquidation);
    assert_eq!(state.ledger.status(&p2), PositionStatus::Active);
    assert_eq!(summary.collateral_to_reserve, dec!(2.1));
    assert_eq!(state.escrow.balance_of(&owner("alice")), dec!(0.5));
    assert_stable_conserved(&state);
}

#[test]
fn test_liquidator_receives_gas_compensation() {
    let mut params = params();
    params.gas_compensation = dec!(10);
    let mut state = ProtocolState::new(params);
    open(&mut state, "whale", dec!(100), dec!(2000));
    let carol = open(&mut state, "carol", dec!(1.9), dec!(180));
    assert_eq!(state.gas.balance(), dec!(20));

    let summary = LifecycleManager::new()
        .liquidate(&mut state, &owner("keeper"), &carol, PRICE)
        .unwrap();

    assert_eq!(summary.gas_compensation, dec!(10));
    assert_eq!(state.wallets.balance(&owner("keeper")).stable, dec!(10));
    // the whale's share stays behind
    assert_eq!(state.gas.balance(), dec!(10));
    assert_stable_conserved(&state);
}

#[test]
fn test_gas_compensation_paid_as_recorded_at_open() {
    let mut params = params();
    params.gas_compensation = dec!(10);
    let mut state = ProtocolState::new(params);
    open(&mut state, "whale", dec!(100), dec!(2000));
    let carol = open(&mut state, "carol", dec!(1.9), dec!(180));

    // parameters replaced after the positions were opened
    state.params.gas_compensation = dec!(200);

    let summary = LifecycleManager::new()
        .liquidate(&mut state, &owner("keeper"), &carol, PRICE)
        .unwrap();

    assert_eq!(summary.gas_compensation, dec!(10));
    assert_eq!(summary.positions[0].gas_compensation, dec!(10));
    assert_eq!(state.wallets.balance(&owner("keeper")).stable, dec!(10));
    assert_eq!(state.gas.balance(), dec!(10));
    assert_stable_conserved(&state);
}

#[test]
fn test_redistribution_works_after_system_drains() {
    let mut state = ProtocolState::new(params());
    let manager = LifecycleManager::new();
    let a = open(&mut state, "alice", dec!(3), dec!(200));
    let b = open(&mut state, "bob", dec!(3), dec!(200));
    let c = open(&mut state, "carol", dec!(1.9), dec!(180));

    // 1.9 over 6 stakes does not divide evenly: the Default Pool keeps dust
    manager.liquidate(&mut state, &owner("keeper"), &c, PRICE).unwrap();
    state.wallets.mint_stable(&owner("saver"), dec!(580));
    deposit(&mut state, "saver", dec!(580));
    manager
        .batch_liquidate(&mut state, &owner("keeper"), &[a, b], dec!(70))
        .unwrap();

    assert_eq!(state.ledger.active_count(), 0);
    assert!(state.default.collateral() > Decimal::ZERO);
    assert!(state.ledger.rewards().total_stakes_snapshot.is_zero());
    assert!(state.ledger.rewards().total_collateral_snapshot.is_zero());

    let d = open(&mut state, "dave", dec!(10), dec!(200));
    let e = open(&mut state, "erin", dec!(1.9), dec!(180));
    assert_eq!(state.ledger.get(&d).unwrap().stake, dec!(10));
    assert_eq!(state.ledger.total_stakes(), dec!(11.9));

    let summary = manager.liquidate(&mut state, &owner("keeper"), &e, PRICE).unwrap();
    assert_eq!(summary.debt_redistributed, dec!(180));
    assert_eq!(state.ledger.pending_rewards(&d).debt, dec!(180));
    assert_pools_match_ledger(&state);
}

#[test]
fn test_invalid_price_rejected() {
    let (mut state, carol) = setup(dec!(1.9));
    let result = LifecycleManager::new().liquidate(
        &mut state,
        &owner("keeper"),
        &carol,
        Decimal::ZERO,
    );
    assert!(matches!(result, Err(ProtocolError::InvalidPrice(_))));
}
