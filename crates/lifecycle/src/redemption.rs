//! Redemption of stable asset against the lowest-ratio positions

use cdp_core::math::require_valid_price;
use cdp_core::{
    Caller, CloseReason, Owner, PositionId, ProtocolError, ProtocolEvent, ProtocolResult, Role,
};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::manager::LifecycleManager;
use crate::state::ProtocolState;

#[derive(Debug, Clone)]
pub struct RedemptionRequest {
    pub redeemer: Owner,
    /// Stable asset to redeem
    pub amount: Decimal,
    /// Stop at the first position whose ratio exceeds this bound
    pub max_ratio: Decimal,
    /// Further limits `max_redemption_positions`
    pub max_iterations: Option<usize>,
    pub price: Decimal,
}

/// Effect on one position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemedLot {
    pub id: PositionId,
    pub debt: Decimal,
    pub collateral: Decimal,
    pub fee: Decimal,
    pub closed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedemptionSummary {
    pub attempted: Decimal,
    pub redeemed: Decimal,
    /// Collateral paid to the redeemer
    pub collateral_sent: Decimal,
    /// Collateral left in the redeemed positions as fee
    pub collateral_fee: Decimal,
    pub lots: Vec<RedeemedLot>,
}

fn round_down(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(18, RoundingStrategy::ToZero)
}

impl LifecycleManager {
    /// Redeem `amount` of stable asset for collateral at `price`
    ///
    /// Walks positions from the lowest ratio, skipping those below the
    /// minimum ratio (they are for liquidation) and stopping at the first one
    /// above `max_ratio`. A partial redemption that would leave a position
    /// under the minimum debt ends the walk instead.
    pub fn redeem(
        &self,
        state: &mut ProtocolState,
        request: &RedemptionRequest,
    ) -> ProtocolResult<RedemptionSummary> {
        let price = require_valid_price(request.price)?;
        if request.amount <= Decimal::ZERO {
            return Err(ProtocolError::invalid_amount("redemption", "must be positive"));
        }
        if request.max_ratio <= Decimal::ZERO {
            return Err(ProtocolError::invalid_amount("max_ratio", "must be positive"));
        }

        state.atomically(|s| {
            s.wallets.require_stable(&request.redeemer, request.amount)?;

            let tcr = s.tcr(price);
            if tcr < s.params.mcr {
                return Err(ProtocolError::BelowMinimumRatio {
                    ratio: tcr,
                    minimum: s.params.mcr,
                });
            }

            let cap = request
                .max_iterations
                .map(|n| n.min(s.params.max_redemption_positions))
                .unwrap_or(s.params.max_redemption_positions);
            let candidates: Vec<PositionId> = s.ledger.iter_ascending().take(cap).cloned().collect();

            let mut summary = RedemptionSummary {
                attempted: request.amount,
                ..RedemptionSummary::default()
            };
            let mut remaining = request.amount;

            for id in candidates {
                if remaining.is_zero() {
                    break;
                }
                let entire = s.ledger.entire_position(&id)?;
                let icr = entire.collateral_ratio(price);
                if icr < s.params.mcr {
                    continue;
                }
                if icr > request.max_ratio {
                    break;
                }

                match self.redeem_from(s, &request.redeemer, &id, remaining, price)? {
                    Some(lot) => {
                        remaining -= lot.debt;
                        summary.redeemed += lot.debt;
                        summary.collateral_sent += lot.collateral;
                        summary.collateral_fee += lot.fee;
                        summary.lots.push(lot);
                    }
                    None => break,
                }
            }

            if summary.redeemed.is_zero() {
                return Err(ProtocolError::NothingToRedeem);
            }

            s.wallets.burn_stable(&request.redeemer, summary.redeemed)?;
            s.wallets.push_collateral(&request.redeemer, summary.collateral_sent);

            tracing::info!(
                redeemer = %request.redeemer,
                attempted = %summary.attempted,
                redeemed = %summary.redeemed,
                collateral = %summary.collateral_sent,
                positions = summary.lots.len(),
                "Redemption completed"
            );

            s.emit(ProtocolEvent::Redemption {
                redeemer: request.redeemer.clone(),
                attempted: summary.attempted,
                redeemed: summary.redeemed,
                collateral_sent: summary.collateral_sent,
                collateral_fee: summary.collateral_fee,
                positions: summary.lots.len(),
            });
            Ok(summary)
        })
    }

    /// Redeem up to `remaining` from one position. `None` means the position
    /// would be left with dust debt and the walk must stop.
    fn redeem_from(
        &self,
        s: &mut ProtocolState,
        redeemer: &Owner,
        id: &PositionId,
        remaining: Decimal,
        price: Decimal,
    ) -> ProtocolResult<Option<RedeemedLot>> {
        let caller = self.caller();

        s.apply_pending_rewards(Self::ROLE, id)?;
        let (collateral, debt, gas_compensation) = match s.ledger.get(id) {
            Some(p) => (p.collateral, p.debt, p.gas_compensation),
            None => return Err(ProtocolError::NotFound(id.to_string())),
        };

        let redeemable = debt - gas_compensation;
        if redeemable <= Decimal::ZERO {
            return Ok(None);
        }
        let lot = remaining.min(redeemable);
        let drawn = round_down(lot / price).min(collateral);
        let fee = round_down(drawn * s.params.redemption_fee_rate);
        let to_redeemer = drawn - fee;

        if lot == redeemable {
            // the whole net debt is gone: close and escrow what is left
            s.gas.withdraw(caller, gas_compensation)?;
            s.active.decrease_debt(caller, debt)?;
            s.ledger.close(caller, id, CloseReason::ByRedemption)?;
            s.active.send_collateral(caller, collateral)?;

            let residual = collateral - to_redeemer;
            if !residual.is_zero() {
                let balance = s.escrow.credit(caller, id.owner(), residual)?;
                s.escrow.receive_collateral(&Caller::from(Role::ActivePool), residual)?;
                s.emit(ProtocolEvent::SurplusCredited {
                    owner: id.owner().clone(),
                    amount: residual,
                    balance,
                });
            }
            s.emit(ProtocolEvent::PositionClosed {
                id: id.clone(),
                reason: CloseReason::ByRedemption,
            });
        } else {
            if redeemable - lot < s.params.min_net_debt {
                tracing::debug!(position = %id, "Partial redemption would leave dust, stopping");
                return Ok(None);
            }
            s.ledger.adjust(caller, id, -to_redeemer, -lot)?;
            s.active.decrease_debt(caller, lot)?;
            s.active.send_collateral(caller, to_redeemer)?;
            s.emit(ProtocolEvent::PositionAdjusted {
                id: id.clone(),
                collateral: collateral - to_redeemer,
                debt: debt - lot,
                borrowing_fee: Decimal::ZERO,
            });
        }

        tracing::debug!(
            position = %id,
            redeemer = %redeemer,
            debt = %lot,
            collateral = %to_redeemer,
            fee = %fee,
            "Position redeemed"
        );

        Ok(Some(RedeemedLot {
            id: id.clone(),
            debt: lot,
            collateral: to_redeemer,
            fee,
            closed: lot == redeemable,
        }))
    }
}
