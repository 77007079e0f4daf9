//! CLI commands

use cdp_core::{Amount, Owner, PositionId};
use cdp_events::{EventReader, EventRecord};
use cdp_ledger::{EntirePosition, Position};
use cdp_lifecycle::{LifecycleManager, LiquidationSummary, RedemptionRequest, RedemptionSummary};
use cdp_operations::{AdjustRequest, PositionOperations};
use cdp_oracle::Price;
use cdp_stability::ReserveReceipt;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::context::AppContext;
use crate::error::CommandError;

fn owner(user: &str) -> Result<Owner, CommandError> {
    Ok(Owner::new(user)?)
}

fn position_id(id: &str) -> Result<PositionId, CommandError> {
    Ok(id.parse()?)
}

/// Credit external collateral to a wallet
pub async fn fund(ctx: &mut AppContext, user: &str, amount: Decimal) -> Result<Decimal, CommandError> {
    let user = owner(user)?;
    let amount = Amount::new(amount)?;

    ctx.state.wallets.fund_collateral(&user, amount.value());
    ctx.save().await?;

    let balance = ctx.state.wallets.balance(&user);
    println!("✅ Funded {} with {} collateral (balance: {})", user, amount, balance.collateral);
    Ok(balance.collateral)
}

/// Move stable asset between wallets
pub async fn transfer(
    ctx: &mut AppContext,
    from: &str,
    to: &str,
    amount: Decimal,
) -> Result<(), CommandError> {
    let (from, to) = (owner(from)?, owner(to)?);
    let amount = Amount::new(amount)?;

    ctx.commit(|s| s.wallets.transfer_stable(&from, &to, amount.value()))
        .await?;

    println!("✅ Transferred {} stable from {} to {}", amount, from, to);
    Ok(())
}

/// Publish a new collateral price
pub async fn set_price(ctx: &mut AppContext, value: Decimal) -> Result<Price, CommandError> {
    let price = ctx.oracle.publish(value).await?;
    println!("✅ Price set: {} = {}", price.pair, price.value);
    Ok(price)
}

pub async fn open(
    ctx: &mut AppContext,
    user: &str,
    collateral: Decimal,
    borrow: Decimal,
) -> Result<PositionId, CommandError> {
    let user = owner(user)?;
    let price = ctx.price().await?;
    let ops = PositionOperations::new();

    let (id, records) = ctx
        .commit(|s| ops.open_position(s, &user, collateral, borrow, price))
        .await?;

    let debt = ctx.state.ledger.get(&id).map(|p| p.debt).unwrap_or_default();
    println!(
        "✅ Opened {} with {} collateral, debt {} (events: {})",
        id,
        collateral,
        debt,
        records.len()
    );
    Ok(id)
}

pub async fn adjust(
    ctx: &mut AppContext,
    user: &str,
    id: &str,
    collateral_change: Decimal,
    debt_change: Decimal,
) -> Result<Position, CommandError> {
    let user = owner(user)?;
    let id = position_id(id)?;
    let price = ctx.price().await?;
    let ops = PositionOperations::new();
    let request = AdjustRequest {
        collateral_change,
        debt_change,
    };

    let (position, _) = ctx
        .commit(|s| ops.adjust_position(s, &user, &id, request, price))
        .await?;

    println!(
        "✅ Adjusted {}: collateral {}, debt {}",
        position.id, position.collateral, position.debt
    );
    Ok(position)
}

pub async fn close(ctx: &mut AppContext, user: &str, id: &str) -> Result<Decimal, CommandError> {
    let user = owner(user)?;
    let id = position_id(id)?;
    let price = ctx.price().await?;
    let ops = PositionOperations::new();

    let (returned, _) = ctx
        .commit(|s| ops.close_position(s, &user, &id, price))
        .await?;

    println!("✅ Closed {}, returned {} collateral", id, returned);
    Ok(returned)
}

/// Claim collateral left over from liquidation or redemption
pub async fn claim(ctx: &mut AppContext, user: &str) -> Result<Decimal, CommandError> {
    let user = owner(user)?;
    let ops = PositionOperations::new();

    let (amount, _) = ctx.commit(|s| ops.claim_surplus(s, &user)).await?;

    println!("✅ {} claimed {} collateral", user, amount);
    Ok(amount)
}

/// Deposit stable asset into the Stability Reserve
pub async fn deposit(
    ctx: &mut AppContext,
    user: &str,
    amount: Decimal,
) -> Result<ReserveReceipt, CommandError> {
    let user = owner(user)?;
    let ops = PositionOperations::new();

    let (receipt, _) = ctx
        .commit(|s| ops.provide_to_reserve(s, &user, amount))
        .await?;

    println!(
        "✅ {} deposited {} (deposit: {}, gain paid: {})",
        user, amount, receipt.deposit, receipt.collateral_gain
    );
    Ok(receipt)
}

/// Withdraw from the Stability Reserve; zero claims the collateral gain only
pub async fn withdraw(
    ctx: &mut AppContext,
    user: &str,
    amount: Decimal,
) -> Result<ReserveReceipt, CommandError> {
    let user = owner(user)?;
    let price = ctx.price().await?;
    let ops = PositionOperations::new();

    let (receipt, _) = ctx
        .commit(|s| ops.withdraw_from_reserve(s, &user, amount, price))
        .await?;

    println!(
        "✅ {} withdrew {} (remaining: {}, gain paid: {})",
        user, receipt.withdrawn, receipt.deposit, receipt.collateral_gain
    );
    Ok(receipt)
}

/// Liquidate the given positions, or scan up to `max` from the riskiest
pub async fn liquidate(
    ctx: &mut AppContext,
    liquidator: &str,
    ids: &[String],
    max: usize,
) -> Result<LiquidationSummary, CommandError> {
    let liquidator = owner(liquidator)?;
    let ids = ids
        .iter()
        .map(|id| position_id(id))
        .collect::<Result<Vec<_>, _>>()?;
    let price = ctx.price().await?;
    let manager = LifecycleManager::new();

    let (summary, _) = ctx
        .commit(|s| match ids.as_slice() {
            [] => manager.liquidate_positions(s, &liquidator, max, price),
            [id] => manager.liquidate(s, &liquidator, id, price),
            _ => manager.batch_liquidate(s, &liquidator, &ids, price),
        })
        .await?;

    println!(
        "✅ Liquidated {} position(s): offset {}, redistributed {}, gas compensation {}",
        summary.count(),
        summary.debt_offset,
        summary.debt_redistributed,
        summary.gas_compensation
    );
    for p in &summary.positions {
        println!("   {} debt {} collateral {} surplus {}", p.id, p.debt, p.collateral, p.surplus);
    }
    Ok(summary)
}

pub async fn redeem(
    ctx: &mut AppContext,
    user: &str,
    amount: Decimal,
    max_ratio: Decimal,
    max_iterations: Option<usize>,
) -> Result<RedemptionSummary, CommandError> {
    let request = RedemptionRequest {
        redeemer: owner(user)?,
        amount,
        max_ratio,
        max_iterations,
        price: ctx.price().await?,
    };
    let manager = LifecycleManager::new();

    let (summary, _) = ctx.commit(|s| manager.redeem(s, &request)).await?;

    println!(
        "✅ Redeemed {} of {} for {} collateral across {} position(s)",
        summary.redeemed,
        summary.attempted,
        summary.collateral_sent,
        summary.lots.len()
    );
    Ok(summary)
}

/// System-wide figures at the current price
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub price: Decimal,
    pub total_collateral: Decimal,
    pub total_debt: Decimal,
    pub tcr: Decimal,
    pub recovery_mode: bool,
    pub active_positions: usize,
    pub reserve_deposits: Decimal,
    pub reserve_collateral: Decimal,
    pub surplus_owed: Decimal,
}

pub async fn status(ctx: &AppContext) -> Result<SystemStatus, CommandError> {
    let price = ctx.price().await?;
    let s = &ctx.state;
    let status = SystemStatus {
        price,
        total_collateral: s.total_collateral(),
        total_debt: s.total_debt(),
        tcr: s.tcr(price),
        recovery_mode: s.is_recovery_mode(price),
        active_positions: s.ledger.active_count(),
        reserve_deposits: s.reserve.total_deposits(),
        reserve_collateral: s.reserve.collateral_balance(),
        surplus_owed: s.escrow.total_owed(),
    };

    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(status)
}

pub async fn position(ctx: &AppContext, id: &str) -> Result<EntirePosition, CommandError> {
    let id = position_id(id)?;
    let entire = ctx.state.ledger.entire_position(&id)?;

    println!("{}", serde_json::to_string_pretty(&entire)?);
    if let Ok(price) = ctx.price().await {
        println!("ICR at {}: {}", price, entire.collateral_ratio(price));
    }
    Ok(entire)
}

/// Show the last `limit` journal records
pub async fn events(ctx: &AppContext, limit: usize) -> Result<Vec<EventRecord>, CommandError> {
    let reader = EventReader::from_directory(ctx.journal_path())?;
    let records = reader.tail(limit)?;

    for record in &records {
        println!(
            "#{} {} {} {}",
            record.sequence,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.kind(),
            record.correlation_id
        );
    }
    Ok(records)
}
