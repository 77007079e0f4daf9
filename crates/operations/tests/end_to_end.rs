//! Full position lifecycles driven through the public operations

use cdp_core::{Owner, PositionId, PositionStatus, ProtocolError, ProtocolEvent, ProtocolParams};
use cdp_lifecycle::{LifecycleManager, ProtocolState, RedemptionRequest};
use cdp_operations::{AdjustRequest, PositionOperations};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn owner(name: &str) -> Owner {
    Owner::new(name).unwrap()
}

fn setup() -> ProtocolState {
    let params = ProtocolParams {
        min_net_debt: dec!(100),
        gas_compensation: dec!(10),
        ..ProtocolParams::default()
    };
    let mut state = ProtocolState::new(params);
    state.wallets.fund_collateral(&owner("alice"), dec!(100));
    state.wallets.fund_collateral(&owner("bob"), dec!(100));
    state.wallets.fund_collateral(&owner("whale"), dec!(1000));
    state
}

fn assert_stable_conserved(state: &ProtocolState) {
    let held = state.wallets.total_stable() + state.reserve.total_deposits() + state.gas.balance();
    assert_eq!(held, state.active.debt() + state.default.debt());
}

fn total_collateral(state: &ProtocolState) -> Decimal {
    state.active.collateral()
        + state.default.collateral()
        + state.escrow.collateral_balance()
        + state.reserve.collateral_balance()
        + state.wallets.total_collateral()
}

#[test]
fn test_open_liquidate_claim_redeem() {
    let mut state = setup();
    let ops = PositionOperations::new();
    let manager = LifecycleManager::new();
    let funded = total_collateral(&state);

    let alice = ops
        .open_position(&mut state, &owner("alice"), dec!(5), dec!(200), dec!(100))
        .unwrap();
    let bob = ops
        .open_position(&mut state, &owner("bob"), dec!(12), dec!(400), dec!(100))
        .unwrap();
    ops.open_position(&mut state, &owner("whale"), dec!(100), dec!(2000), dec!(100))
        .unwrap();
    ops.provide_to_reserve(&mut state, &owner("whale"), dec!(1500))
        .unwrap();

    assert_eq!(state.ledger.get(&alice).unwrap().debt, dec!(211));
    assert_eq!(state.gas.balance(), dec!(30));
    assert_stable_conserved(&state);

    // at 45 only alice falls under 110%
    let price = dec!(45);
    let summary = manager
        .liquidate_positions(&mut state, &owner("keeper"), 10, price)
        .unwrap();
    assert_eq!(summary.count(), 1);
    assert_eq!(summary.positions[0].id, alice);
    assert_eq!(summary.debt_offset, dec!(211));
    assert_eq!(summary.collateral_to_reserve + summary.surplus, dec!(5));
    assert_eq!(state.ledger.status(&alice), PositionStatus::ClosedByLiquidation);
    assert_eq!(state.wallets.balance(&owner("keeper")).stable, dec!(10));
    assert_stable_conserved(&state);

    // alice can claim what was left once
    let claimed = ops.claim_surplus(&mut state, &owner("alice")).unwrap();
    assert_eq!(claimed, summary.surplus);
    assert_eq!(state.wallets.balance(&owner("alice")).collateral, dec!(95) + claimed);
    let again = ops.claim_surplus(&mut state, &owner("alice"));
    assert!(matches!(again, Err(ProtocolError::NothingToClaim(_))));

    // closing a liquidated position fails
    let closed = ops.close_position(&mut state, &owner("alice"), &alice, price);
    assert!(matches!(closed, Err(ProtocolError::NotActive(_))));

    // the whale redeems against bob, now the riskiest position
    let whale_stable = state.wallets.balance(&owner("whale")).stable;
    let redemption = manager
        .redeem(
            &mut state,
            &RedemptionRequest {
                redeemer: owner("whale"),
                amount: dec!(100),
                max_ratio: dec!(10),
                max_iterations: None,
                price,
            },
        )
        .unwrap();
    assert_eq!(redemption.redeemed, dec!(100));
    assert_eq!(redemption.lots[0].id, bob);
    assert_eq!(state.ledger.get(&bob).unwrap().debt, dec!(312));
    assert_eq!(
        state.wallets.balance(&owner("whale")).stable,
        whale_stable - dec!(100)
    );

    // reserve gain is withdrawable at any time
    let receipt = ops
        .withdraw_from_reserve(&mut state, &owner("whale"), Decimal::ZERO, price)
        .unwrap();
    assert!(receipt.deposit <= dec!(1289));
    assert!(dec!(1289) - receipt.deposit < dec!(0.000000001));
    assert!(receipt.collateral_gain <= summary.collateral_to_reserve);
    assert!(summary.collateral_to_reserve - receipt.collateral_gain < dec!(0.000000001));

    assert_stable_conserved(&state);
    assert_eq!(total_collateral(&state), funded);
}

#[test]
fn test_reopen_after_close_gets_new_index() {
    let mut state = setup();
    let ops = PositionOperations::new();
    let price = dec!(100);

    ops.open_position(&mut state, &owner("whale"), dec!(100), dec!(2000), price)
        .unwrap();
    let first = ops
        .open_position(&mut state, &owner("alice"), dec!(5), dec!(200), price)
        .unwrap();
    // the borrowing fee has to come from elsewhere
    state
        .wallets
        .transfer_stable(&owner("whale"), &owner("alice"), dec!(1))
        .unwrap();
    let returned = ops.close_position(&mut state, &owner("alice"), &first, price).unwrap();
    assert_eq!(returned, dec!(5));
    assert_eq!(state.ledger.status(&first), PositionStatus::ClosedByOwner);

    let second = ops
        .open_position(&mut state, &owner("alice"), dec!(5), dec!(200), price)
        .unwrap();
    assert_eq!(second, PositionId::new(owner("alice"), 1));
    assert_ne!(first, second);
    assert_stable_conserved(&state);
}

#[test]
fn test_recovery_mode_restrictions() {
    let mut state = setup();
    let ops = PositionOperations::new();

    let alice = ops
        .open_position(&mut state, &owner("alice"), dec!(5), dec!(200), dec!(100))
        .unwrap();
    ops.open_position(&mut state, &owner("bob"), dec!(6), dec!(200), dec!(100))
        .unwrap();

    // TCR drops to about 1.43
    let price = dec!(55);
    assert!(state.is_recovery_mode(price));

    let close = ops.close_position(&mut state, &owner("alice"), &alice, price);
    assert!(matches!(close, Err(ProtocolError::RecoveryModeRestriction(_))));

    let withdraw = ops.adjust_position(
        &mut state,
        &owner("alice"),
        &alice,
        AdjustRequest {
            collateral_change: dec!(-1),
            debt_change: Decimal::ZERO,
        },
        price,
    );
    assert!(matches!(withdraw, Err(ProtocolError::RecoveryModeRestriction(_))));

    // topping up is always allowed
    let topped = ops
        .adjust_position(
            &mut state,
            &owner("alice"),
            &alice,
            AdjustRequest {
                collateral_change: dec!(2),
                debt_change: Decimal::ZERO,
            },
            price,
        )
        .unwrap();
    assert_eq!(topped.collateral, dec!(7));

    // new positions need 150% and pay no borrowing fee
    let low = ops.open_position(&mut state, &owner("whale"), dec!(5), dec!(200), price);
    assert!(matches!(low, Err(ProtocolError::BelowMinimumRatio { .. })));
    let id = ops
        .open_position(&mut state, &owner("whale"), dec!(10), dec!(200), price)
        .unwrap();
    assert_eq!(state.ledger.get(&id).unwrap().debt, dec!(210));
}

#[test]
fn test_failed_operation_emits_nothing() {
    let mut state = setup();
    let ops = PositionOperations::new();

    ops.open_position(&mut state, &owner("alice"), dec!(5), dec!(200), dec!(100))
        .unwrap();
    let opened = state.drain_events();
    assert!(matches!(opened.as_slice(), [ProtocolEvent::PositionOpened { .. }]));

    let result = ops.open_position(&mut state, &owner("bob"), dec!(1), dec!(200), dec!(100));
    assert!(result.is_err());
    assert!(state.pending_events().is_empty());
    assert_eq!(state.wallets.balance(&owner("bob")).collateral, dec!(100));
}
