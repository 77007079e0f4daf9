mod common;

use cdp_core::{PositionId, PositionStatus, ProtocolError, ProtocolEvent};
use cdp_lifecycle::{LifecycleManager, ProtocolState, RedemptionRequest};
use common::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// A at 120%, B at 150%, C at 200%; the whale holds the stable to redeem
fn ladder() -> (ProtocolState, PositionId, PositionId, PositionId) {
    let mut state = ProtocolState::new(params());
    let a = open(&mut state, "alice", dec!(2.4), dec!(200));
    let b = open(&mut state, "bob", dec!(3), dec!(200));
    let c = open(&mut state, "carol", dec!(4), dec!(200));
    open(&mut state, "whale", dec!(100), dec!(1000));
    (state, a, b, c)
}

fn request(amount: Decimal, max_ratio: Decimal) -> RedemptionRequest {
    RedemptionRequest {
        redeemer: owner("whale"),
        amount,
        max_ratio,
        max_iterations: None,
        price: PRICE,
    }
}

#[test]
fn test_redeeming_two_positions_exactly_leaves_the_third() {
    let (mut state, a, b, c) = ladder();
    let c_before = state.ledger.get(&c).unwrap().clone();

    let summary = LifecycleManager::new()
        .redeem(&mut state, &request(dec!(400), dec!(100)))
        .unwrap();

    assert_eq!(summary.redeemed, dec!(400));
    let redeemed: Vec<_> = summary.lots.iter().map(|l| l.id.clone()).collect();
    assert_eq!(redeemed, vec![a.clone(), b.clone()]);
    assert!(summary.lots.iter().all(|l| l.closed));
    assert_eq!(summary.collateral_sent, dec!(3.98));

    assert_eq!(state.ledger.status(&a), PositionStatus::ClosedByRedemption);
    assert_eq!(state.ledger.status(&b), PositionStatus::ClosedByRedemption);
    assert_eq!(state.escrow.balance_of(&owner("alice")), dec!(0.41));
    assert_eq!(state.escrow.balance_of(&owner("bob")), dec!(1.01));

    assert_eq!(state.ledger.get(&c).unwrap(), &c_before);
    assert_eq!(state.ledger.status(&c), PositionStatus::Active);
    assert_eq!(state.wallets.balance(&owner("whale")).stable, dec!(600));
    assert_stable_conserved(&state);
    assert_pools_match_ledger(&state);
}

#[test]
fn test_redeems_lowest_ratio_first() {
    let (mut state, a, b, c) = ladder();
    let before = total_collateral_everywhere(&state);

    let summary = LifecycleManager::new()
        .redeem(&mut state, &request(dec!(300), dec!(100)))
        .unwrap();

    assert_eq!(summary.redeemed, dec!(300));
    assert_eq!(summary.lots.len(), 2);
    assert_eq!(summary.collateral_sent, dec!(2.985));
    assert_eq!(summary.collateral_fee, dec!(0.015));

    // A is fully redeemed; the fee and the excess collateral go to escrow
    assert!(summary.lots[0].closed);
    assert_eq!(state.ledger.status(&a), PositionStatus::ClosedByRedemption);
    assert_eq!(state.escrow.balance_of(&owner("alice")), dec!(0.41));

    // B is partially redeemed and keeps its fee
    assert!(!summary.lots[1].closed);
    let b_after = state.ledger.get(&b).unwrap();
    assert_eq!(b_after.debt, dec!(100));
    assert_eq!(b_after.collateral, dec!(2.005));

    let c_after = state.ledger.get(&c).unwrap();
    assert_eq!(c_after.debt, dec!(200));

    let whale = state.wallets.balance(&owner("whale"));
    assert_eq!(whale.stable, dec!(700));
    assert_eq!(whale.collateral, dec!(2.985));

    assert_eq!(total_collateral_everywhere(&state), before);
    assert_stable_conserved(&state);
    assert_pools_match_ledger(&state);
}

#[test]
fn test_partial_redemption_never_leaves_dust() {
    let (mut state, a, b, _) = ladder();

    let summary = LifecycleManager::new()
        .redeem(&mut state, &request(dec!(350), dec!(100)))
        .unwrap();

    // 150 from B would leave 50, under the minimum debt
    assert_eq!(summary.redeemed, dec!(200));
    assert_eq!(summary.lots.len(), 1);
    assert_eq!(state.ledger.status(&a), PositionStatus::ClosedByRedemption);
    assert_eq!(state.ledger.get(&b).unwrap().debt, dec!(200));
    assert_eq!(state.wallets.balance(&owner("whale")).stable, dec!(800));
    assert_stable_conserved(&state);
}

#[test]
fn test_positions_below_mcr_are_skipped() {
    let (mut state, a, _, _) = ladder();
    let risky = open(&mut state, "dave", dec!(2.1), dec!(200));

    let summary = LifecycleManager::new()
        .redeem(&mut state, &request(dec!(200), dec!(100)))
        .unwrap();

    assert_eq!(summary.lots[0].id, a);
    assert_eq!(state.ledger.status(&risky), PositionStatus::Active);
    assert_eq!(state.ledger.get(&risky).unwrap().debt, dec!(200));
}

#[test]
fn test_max_ratio_bounds_the_walk() {
    let (mut state, a, b, _) = ladder();

    let summary = LifecycleManager::new()
        .redeem(&mut state, &request(dec!(300), dec!(1.3)))
        .unwrap();

    assert_eq!(summary.redeemed, dec!(200));
    assert_eq!(summary.lots[0].id, a);
    assert_eq!(state.ledger.get(&b).unwrap().debt, dec!(200));
}

#[test]
fn test_nothing_redeemable_leaves_state_unchanged() {
    let (mut state, a, _, _) = ladder();
    let snapshot = serde_json::to_string(&state).unwrap();

    let result = LifecycleManager::new().redeem(&mut state, &request(dec!(300), dec!(1.1)));

    assert!(matches!(result, Err(ProtocolError::NothingToRedeem)));
    assert_eq!(serde_json::to_string(&state).unwrap(), snapshot);
    assert_eq!(state.ledger.status(&a), PositionStatus::Active);
    assert!(state.pending_events().is_empty());
}

#[test]
fn test_redeemer_needs_the_stable_asset() {
    let (mut state, _, _, _) = ladder();
    let mut req = request(dec!(100), dec!(100));
    req.redeemer = owner("nobody");

    let result = LifecycleManager::new().redeem(&mut state, &req);
    assert!(matches!(result, Err(ProtocolError::InsufficientFunds { .. })));
}

#[test]
fn test_iteration_cap_counts_visited_positions() {
    let (mut state, a, b, _) = ladder();
    let mut req = request(dec!(300), dec!(100));
    req.max_iterations = Some(1);

    let summary = LifecycleManager::new().redeem(&mut state, &req).unwrap();

    assert_eq!(summary.redeemed, dec!(200));
    assert_eq!(state.ledger.status(&a), PositionStatus::ClosedByRedemption);
    assert_eq!(state.ledger.get(&b).unwrap().debt, dec!(200));
}

#[test]
fn test_blocked_when_system_below_mcr() {
    let mut state = ProtocolState::new(params());
    open(&mut state, "alice", dec!(2.1), dec!(200));

    let mut req = request(dec!(100), dec!(100));
    req.redeemer = owner("alice");
    let result = LifecycleManager::new().redeem(&mut state, &req);
    assert!(matches!(result, Err(ProtocolError::BelowMinimumRatio { .. })));
}

#[test]
fn test_invalid_requests_rejected() {
    let (mut state, _, _, _) = ladder();
    let manager = LifecycleManager::new();

    let zero = manager.redeem(&mut state, &request(Decimal::ZERO, dec!(100)));
    assert!(matches!(zero, Err(ProtocolError::InvalidAmount { .. })));

    let mut bad_price = request(dec!(100), dec!(100));
    bad_price.price = dec!(-1);
    let result = manager.redeem(&mut state, &bad_price);
    assert!(matches!(result, Err(ProtocolError::InvalidPrice(_))));
}

#[test]
fn test_full_redemption_burns_gas_compensation() {
    let mut params = params();
    params.gas_compensation = dec!(10);
    let mut state = ProtocolState::new(params);
    let a = open(&mut state, "alice", dec!(2.52), dec!(210));
    open(&mut state, "whale", dec!(100), dec!(1000));
    assert_eq!(state.gas.balance(), dec!(20));

    let summary = LifecycleManager::new()
        .redeem(&mut state, &request(dec!(200), dec!(100)))
        .unwrap();

    assert!(summary.lots[0].closed);
    assert_eq!(state.ledger.status(&a), PositionStatus::ClosedByRedemption);
    // only alice's share is burned
    assert_eq!(state.gas.balance(), dec!(10));
    // 2 drawn, 0.01 fee: 0.53 is left for the owner
    assert_eq!(state.escrow.balance_of(&owner("alice")), dec!(0.53));
    assert_stable_conserved(&state);
    assert_pools_match_ledger(&state);

    let closed = state
        .pending_events()
        .iter()
        .any(|e| matches!(e, ProtocolEvent::PositionClosed { id, .. } if *id == a));
    assert!(closed);
}

#[test]
fn test_redemption_applies_pending_rewards() {
    let mut state = ProtocolState::new(params());
    let a = open(&mut state, "alice", dec!(2.4), dec!(200));
    open(&mut state, "whale", dec!(100), dec!(1000));
    let carol = open(&mut state, "carol", dec!(1.9), dec!(180));
    LifecycleManager::new()
        .liquidate(&mut state, &owner("keeper"), &carol, PRICE)
        .unwrap();
    assert!(!state.ledger.pending_rewards(&a).is_zero());

    LifecycleManager::new()
        .redeem(&mut state, &request(dec!(100), dec!(100)))
        .unwrap();

    assert!(state.ledger.pending_rewards(&a).is_zero());
    assert_stable_conserved(&state);
    assert_pools_match_ledger(&state);
}
