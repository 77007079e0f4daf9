//! Liquidation of under-collateralized positions
//!
//! Per position, debt is first offset against whatever the Stability Reserve
//! can still absorb in this batch, the rest is redistributed to active
//! positions, and collateral beyond both penalty caps is escrowed for the
//! owner. A batch settles once: one reserve offset, one redistribution, one
//! snapshot update.

use cdp_core::math::{collateral_ratio, require_valid_price};
use cdp_core::{
    Caller, CloseReason, Owner, PositionId, ProtocolError, ProtocolEvent, ProtocolParams,
    ProtocolResult, Role,
};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::manager::LifecycleManager;
use crate::state::ProtocolState;

/// How one position's debt and collateral were disposed of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidatedPosition {
    pub id: PositionId,
    pub collateral: Decimal,
    pub debt: Decimal,
    pub debt_offset: Decimal,
    pub collateral_to_reserve: Decimal,
    pub debt_redistributed: Decimal,
    pub collateral_redistributed: Decimal,
    pub surplus: Decimal,
    /// Paid to the liquidator from the Gas Pool
    pub gas_compensation: Decimal,
}

/// Totals of a liquidation batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiquidationSummary {
    pub positions: Vec<LiquidatedPosition>,
    pub debt_offset: Decimal,
    pub collateral_to_reserve: Decimal,
    pub debt_redistributed: Decimal,
    pub collateral_redistributed: Decimal,
    pub surplus: Decimal,
    pub gas_compensation: Decimal,
}

impl LiquidationSummary {
    fn add(&mut self, position: LiquidatedPosition) {
        self.debt_offset += position.debt_offset;
        self.collateral_to_reserve += position.collateral_to_reserve;
        self.debt_redistributed += position.debt_redistributed;
        self.collateral_redistributed += position.collateral_redistributed;
        self.surplus += position.surplus;
        self.gas_compensation += position.gas_compensation;
        self.positions.push(position);
    }

    pub fn count(&self) -> usize {
        self.positions.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Caller-supplied ids; ineligible ones are skipped
    Explicit,
    /// Lowest ratio first; stops at the first position that cannot qualify
    Ascending,
}

fn round_down(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(18, RoundingStrategy::ToZero)
}

/// Split a position between the reserve, redistribution and surplus
fn split_position(
    id: PositionId,
    collateral: Decimal,
    debt: Decimal,
    reserve_available: Decimal,
    price: Decimal,
    params: &ProtocolParams,
) -> LiquidatedPosition {
    let debt_offset = debt.min(reserve_available);
    let collateral_to_reserve = if debt_offset.is_zero() {
        Decimal::ZERO
    } else {
        let proportional = collateral * debt_offset / debt;
        let capped = debt_offset * (Decimal::ONE + params.liquidation_penalty_sp) / price;
        round_down(proportional.min(capped))
    };

    let debt_redistributed = debt - debt_offset;
    let remaining = collateral - collateral_to_reserve;
    let collateral_redistributed = if debt_redistributed.is_zero() {
        Decimal::ZERO
    } else {
        let capped = debt_redistributed * (Decimal::ONE + params.liquidation_penalty_redistribution) / price;
        round_down(remaining.min(capped))
    };

    LiquidatedPosition {
        id,
        collateral,
        debt,
        debt_offset,
        collateral_to_reserve,
        debt_redistributed,
        collateral_redistributed,
        surplus: remaining - collateral_redistributed,
        gas_compensation: Decimal::ZERO,
    }
}

impl LifecycleManager {
    /// Liquidate a single position
    pub fn liquidate(
        &self,
        state: &mut ProtocolState,
        liquidator: &Owner,
        id: &PositionId,
        price: Decimal,
    ) -> ProtocolResult<LiquidationSummary> {
        state.ledger.entire_position(id)?;
        self.batch_liquidate(state, liquidator, std::slice::from_ref(id), price)
    }

    /// Liquidate every eligible position among `ids`
    pub fn batch_liquidate(
        &self,
        state: &mut ProtocolState,
        liquidator: &Owner,
        ids: &[PositionId],
        price: Decimal,
    ) -> ProtocolResult<LiquidationSummary> {
        require_valid_price(price)?;
        let limit = state.params.max_liquidation_batch;
        if ids.len() > limit {
            return Err(ProtocolError::invalid_amount(
                "positions",
                format!("at most {} per batch", limit),
            ));
        }

        state.atomically(|s| self.run(s, liquidator, ids.to_vec(), Scan::Explicit, price))
    }

    /// Scan up to `max` positions from the lowest ratio and liquidate those
    /// that qualify
    pub fn liquidate_positions(
        &self,
        state: &mut ProtocolState,
        liquidator: &Owner,
        max: usize,
        price: Decimal,
    ) -> ProtocolResult<LiquidationSummary> {
        require_valid_price(price)?;
        let limit = max.min(state.params.max_liquidation_batch);

        state.atomically(|s| {
            let candidates: Vec<PositionId> = s.ledger.iter_ascending().take(limit).cloned().collect();
            self.run(s, liquidator, candidates, Scan::Ascending, price)
        })
    }

    fn run(
        &self,
        s: &mut ProtocolState,
        liquidator: &Owner,
        candidates: Vec<PositionId>,
        scan: Scan,
        price: Decimal,
    ) -> ProtocolResult<LiquidationSummary> {
        let params = s.params.clone();
        let mut system_collateral = s.total_collateral();
        let mut system_debt = s.total_debt();
        let mut reserve_available = s.reserve.total_deposits();
        let mut summary = LiquidationSummary::default();

        for id in candidates {
            // closed earlier in this batch, or never existed
            let Ok(entire) = s.ledger.entire_position(&id) else {
                continue;
            };

            let icr = entire.collateral_ratio(price);
            let tcr = collateral_ratio(system_collateral, system_debt, price);
            let recovery = tcr < params.ccr;

            let eligible = icr < params.mcr
                || (recovery && icr < params.ccr && icr < tcr && reserve_available >= entire.debt);
            if !eligible {
                match scan {
                    Scan::Ascending if !recovery || icr >= params.ccr => break,
                    _ => continue,
                }
            }

            s.apply_pending_rewards(Self::ROLE, &id)?;
            let closed = s.ledger.close(self.caller(), &id, CloseReason::ByLiquidation)?;
            let liquidated = LiquidatedPosition {
                gas_compensation: closed.gas_compensation,
                ..split_position(
                    id.clone(),
                    closed.collateral,
                    closed.debt,
                    reserve_available,
                    price,
                    &params,
                )
            };

            reserve_available -= liquidated.debt_offset;
            system_collateral -= liquidated.collateral_to_reserve + liquidated.surplus;
            system_debt -= liquidated.debt_offset;

            if !liquidated.surplus.is_zero() {
                let balance = s.escrow.credit(self.caller(), id.owner(), liquidated.surplus)?;
                s.emit(ProtocolEvent::SurplusCredited {
                    owner: id.owner().clone(),
                    amount: liquidated.surplus,
                    balance,
                });
            }

            tracing::info!(
                position = %id,
                icr = %icr,
                recovery_mode = recovery,
                debt_offset = %liquidated.debt_offset,
                debt_redistributed = %liquidated.debt_redistributed,
                surplus = %liquidated.surplus,
                "Position liquidated"
            );

            s.emit(ProtocolEvent::PositionLiquidated {
                id: id.clone(),
                debt: liquidated.debt,
                collateral: liquidated.collateral,
                debt_offset: liquidated.debt_offset,
                collateral_to_reserve: liquidated.collateral_to_reserve,
                debt_redistributed: liquidated.debt_redistributed,
                collateral_redistributed: liquidated.collateral_redistributed,
                surplus: liquidated.surplus,
            });
            s.emit(ProtocolEvent::PositionClosed {
                id,
                reason: CloseReason::ByLiquidation,
            });
            summary.add(liquidated);
        }

        if summary.positions.is_empty() {
            return Err(ProtocolError::NothingToLiquidate);
        }

        self.settle(s, liquidator, &mut summary)?;
        Ok(summary)
    }

    /// Move the batch totals between pools in one pass
    fn settle(
        &self,
        s: &mut ProtocolState,
        liquidator: &Owner,
        summary: &mut LiquidationSummary,
    ) -> ProtocolResult<()> {
        let caller = self.caller();
        let active_pool = Caller::from(Role::ActivePool);

        if !summary.debt_offset.is_zero() {
            let outcome = s
                .reserve
                .offset(caller, summary.debt_offset, summary.collateral_to_reserve)?;
            s.active.decrease_debt(caller, summary.debt_offset)?;
            s.active.send_collateral(caller, summary.collateral_to_reserve)?;
            s.emit(ProtocolEvent::ReserveOffset {
                debt: summary.debt_offset,
                collateral: summary.collateral_to_reserve,
                epoch: outcome.epoch,
                scale: outcome.scale,
            });
        }

        if !summary.debt_redistributed.is_zero() || !summary.collateral_redistributed.is_zero() {
            let rewards = s.ledger.redistribute(
                caller,
                summary.debt_redistributed,
                summary.collateral_redistributed,
            )?;
            let (l_debt, l_collateral) = (rewards.l_debt, rewards.l_collateral);

            s.active.decrease_debt(caller, summary.debt_redistributed)?;
            s.default.increase_debt(caller, summary.debt_redistributed)?;
            s.active.send_collateral(caller, summary.collateral_redistributed)?;
            s.default
                .receive_collateral(&active_pool, summary.collateral_redistributed)?;
            s.emit(ProtocolEvent::Redistribution {
                debt: summary.debt_redistributed,
                collateral: summary.collateral_redistributed,
                l_debt,
                l_collateral,
            });
        }

        if !summary.surplus.is_zero() {
            s.active.send_collateral(caller, summary.surplus)?;
            s.escrow.receive_collateral(&active_pool, summary.surplus)?;
        }

        if !summary.gas_compensation.is_zero() {
            s.gas.withdraw(caller, summary.gas_compensation)?;
            s.wallets.mint_stable(liquidator, summary.gas_compensation);
        }

        let total_collateral = s.total_collateral();
        let unowned = (s.default.debt(), s.default.collateral());
        s.ledger.update_system_snapshots(caller, total_collateral, unowned)?;

        tracing::info!(
            liquidator = %liquidator,
            positions = summary.count(),
            debt_offset = %summary.debt_offset,
            debt_redistributed = %summary.debt_redistributed,
            "Liquidation settled"
        );

        s.emit(ProtocolEvent::Liquidation {
            liquidator: liquidator.clone(),
            positions: summary.count(),
            debt_offset: summary.debt_offset,
            debt_redistributed: summary.debt_redistributed,
            gas_compensation: summary.gas_compensation,
        });
        Ok(())
    }
}
