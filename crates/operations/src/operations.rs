//! Position entry points: open, adjust, close, claim

use cdp_core::math::{collateral_ratio, require_valid_price};
use cdp_core::{
    Caller, CloseReason, Owner, PositionId, ProtocolError, ProtocolEvent, ProtocolResult, Role,
};
use cdp_ledger::Position;
use cdp_lifecycle::ProtocolState;
use rust_decimal::Decimal;

/// Signed changes to a position; positive adds collateral or borrows more
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdjustRequest {
    pub collateral_change: Decimal,
    pub debt_change: Decimal,
}

/// User-initiated position lifecycle
///
/// Identifies itself to pools, ledger and reserve as
/// `Role::PositionOperations`. It is the only path to `SurplusEscrow::claim`.
#[derive(Debug, Clone)]
pub struct PositionOperations {
    caller: Caller,
}

impl Default for PositionOperations {
    fn default() -> Self {
        Self::new()
    }
}

fn require_owner(owner: &Owner, id: &PositionId) -> ProtocolResult<()> {
    if id.owner() != owner {
        return Err(ProtocolError::NotAuthorized {
            caller: Caller::Account(owner.clone()).to_string(),
            required: format!("owner of {}", id),
        });
    }
    Ok(())
}

impl PositionOperations {
    pub const ROLE: Role = Role::PositionOperations;

    pub fn new() -> Self {
        Self {
            caller: Caller::from(Self::ROLE),
        }
    }

    pub(crate) fn caller(&self) -> &Caller {
        &self.caller
    }

    /// Open a new position for `owner`, pulling `collateral` from their wallet
    /// and minting `borrow` to it
    pub fn open_position(
        &self,
        state: &mut ProtocolState,
        owner: &Owner,
        collateral: Decimal,
        borrow: Decimal,
        price: Decimal,
    ) -> ProtocolResult<PositionId> {
        let price = require_valid_price(price)?;
        if collateral <= Decimal::ZERO {
            return Err(ProtocolError::invalid_amount("collateral", "must be positive"));
        }
        if borrow <= Decimal::ZERO {
            return Err(ProtocolError::invalid_amount("borrow", "must be positive"));
        }

        state.atomically(|s| {
            let params = s.params.clone();
            let recovery = s.is_recovery_mode(price);

            let fee = if recovery {
                Decimal::ZERO
            } else {
                params.borrowing_fee(borrow)
            };
            let net_debt = borrow + fee;
            if net_debt < params.min_net_debt {
                return Err(ProtocolError::invalid_amount(
                    "debt",
                    format!("net debt {} is below the minimum {}", net_debt, params.min_net_debt),
                ));
            }
            let debt = params.composite_debt(net_debt);

            let icr = collateral_ratio(collateral, debt, price);
            if recovery {
                if icr < params.ccr {
                    return Err(ProtocolError::BelowMinimumRatio {
                        ratio: icr,
                        minimum: params.ccr,
                    });
                }
            } else {
                if icr < params.mcr {
                    return Err(ProtocolError::BelowMinimumRatio {
                        ratio: icr,
                        minimum: params.mcr,
                    });
                }
                let tcr = s.tcr_after(collateral, debt, price);
                if tcr < params.ccr {
                    return Err(ProtocolError::BelowMinimumRatio {
                        ratio: tcr,
                        minimum: params.ccr,
                    });
                }
            }

            let id = PositionId::new(owner.clone(), s.ledger.next_index(owner));
            let caller = self.caller();

            s.wallets.pull_collateral(owner, collateral)?;
            s.active.receive_collateral(caller, collateral)?;
            s.ledger.open(caller, &id, collateral, debt, params.gas_compensation)?;
            s.active.increase_debt(caller, debt)?;

            s.wallets.mint_stable(owner, borrow);
            s.wallets.mint_stable(&params.treasury, fee);
            if !params.gas_compensation.is_zero() {
                s.gas.deposit(caller, params.gas_compensation)?;
            }

            tracing::info!(
                position = %id,
                collateral = %collateral,
                debt = %debt,
                fee = %fee,
                icr = %icr,
                "Position opened"
            );
            s.emit(ProtocolEvent::PositionOpened {
                id: id.clone(),
                collateral,
                debt,
                borrowing_fee: fee,
            });
            Ok(id)
        })
    }

    /// Add or withdraw collateral and borrow or repay debt in one step
    pub fn adjust_position(
        &self,
        state: &mut ProtocolState,
        owner: &Owner,
        id: &PositionId,
        request: AdjustRequest,
        price: Decimal,
    ) -> ProtocolResult<Position> {
        let price = require_valid_price(price)?;
        require_owner(owner, id)?;
        if request.collateral_change.is_zero() && request.debt_change.is_zero() {
            return Err(ProtocolError::invalid_amount("adjustment", "no change requested"));
        }

        state.atomically(|s| {
            let params = s.params.clone();
            let caller = self.caller();
            let recovery = s.is_recovery_mode(price);
            let withdrawing = request.collateral_change < Decimal::ZERO;
            let borrowing = request.debt_change > Decimal::ZERO;

            if recovery && withdrawing {
                return Err(ProtocolError::RecoveryModeRestriction("collateral withdrawal"));
            }

            s.apply_pending_rewards(Self::ROLE, id)?;
            let (collateral, debt, gas_compensation) = match s.ledger.get(id) {
                Some(p) => (p.collateral, p.debt, p.gas_compensation),
                None => return Err(ProtocolError::NotFound(id.to_string())),
            };

            let fee = if borrowing && !recovery {
                params.borrowing_fee(request.debt_change)
            } else {
                Decimal::ZERO
            };
            let debt_delta = request.debt_change + fee;
            let new_collateral = collateral + request.collateral_change;
            let new_debt = debt + debt_delta;

            if new_collateral <= Decimal::ZERO {
                return Err(ProtocolError::invalid_amount(
                    "collateral",
                    format!("cannot withdraw more than {}", collateral),
                ));
            }
            if new_debt - gas_compensation < params.min_net_debt {
                return Err(ProtocolError::invalid_amount(
                    "debt",
                    format!("net debt must stay at least {}", params.min_net_debt),
                ));
            }

            let old_icr = collateral_ratio(collateral, debt, price);
            let new_icr = collateral_ratio(new_collateral, new_debt, price);
            if recovery {
                if borrowing && new_icr < params.ccr {
                    return Err(ProtocolError::BelowMinimumRatio {
                        ratio: new_icr,
                        minimum: params.ccr,
                    });
                }
                if new_icr < old_icr {
                    return Err(ProtocolError::RecoveryModeRestriction(
                        "adjustment would lower the collateral ratio",
                    ));
                }
            } else {
                if new_icr < params.mcr {
                    return Err(ProtocolError::BelowMinimumRatio {
                        ratio: new_icr,
                        minimum: params.mcr,
                    });
                }
                let tcr = s.tcr_after(request.collateral_change, debt_delta, price);
                if tcr < params.ccr {
                    return Err(ProtocolError::BelowMinimumRatio {
                        ratio: tcr,
                        minimum: params.ccr,
                    });
                }
            }

            if request.collateral_change > Decimal::ZERO {
                s.wallets.pull_collateral(owner, request.collateral_change)?;
                s.active.receive_collateral(caller, request.collateral_change)?;
            } else if withdrawing {
                let amount = -request.collateral_change;
                s.active.send_collateral(caller, amount)?;
                s.wallets.push_collateral(owner, amount);
            }

            if borrowing {
                s.active.increase_debt(caller, debt_delta)?;
                s.wallets.mint_stable(owner, request.debt_change);
                s.wallets.mint_stable(&params.treasury, fee);
            } else if request.debt_change < Decimal::ZERO {
                let repay = -request.debt_change;
                s.wallets.burn_stable(owner, repay)?;
                s.active.decrease_debt(caller, repay)?;
            }

            let position = s
                .ledger
                .adjust(caller, id, request.collateral_change, debt_delta)?
                .clone();

            tracing::info!(
                position = %id,
                collateral = %position.collateral,
                debt = %position.debt,
                fee = %fee,
                "Position adjusted"
            );
            s.emit(ProtocolEvent::PositionAdjusted {
                id: id.clone(),
                collateral: position.collateral,
                debt: position.debt,
                borrowing_fee: fee,
            });
            Ok(position)
        })
    }

    /// Repay the net debt and take back all collateral. Returns the
    /// collateral paid out.
    pub fn close_position(
        &self,
        state: &mut ProtocolState,
        owner: &Owner,
        id: &PositionId,
        price: Decimal,
    ) -> ProtocolResult<Decimal> {
        let price = require_valid_price(price)?;
        require_owner(owner, id)?;

        state.atomically(|s| {
            let caller = self.caller();
            s.ledger.entire_position(id)?;
            if s.is_recovery_mode(price) {
                return Err(ProtocolError::RecoveryModeRestriction("closing a position"));
            }

            s.apply_pending_rewards(Self::ROLE, id)?;
            let (collateral, debt, gas_compensation) = match s.ledger.get(id) {
                Some(p) => (p.collateral, p.debt, p.gas_compensation),
                None => return Err(ProtocolError::NotFound(id.to_string())),
            };

            let tcr = s.tcr_after(-collateral, -debt, price);
            if tcr < s.params.ccr {
                return Err(ProtocolError::BelowMinimumRatio {
                    ratio: tcr,
                    minimum: s.params.ccr,
                });
            }

            s.wallets.burn_stable(owner, debt - gas_compensation)?;
            s.gas.withdraw(caller, gas_compensation)?;
            s.active.decrease_debt(caller, debt)?;
            s.ledger.close(caller, id, CloseReason::ByOwner)?;
            s.active.send_collateral(caller, collateral)?;
            s.wallets.push_collateral(owner, collateral);

            tracing::info!(position = %id, collateral = %collateral, debt = %debt, "Position closed");
            s.emit(ProtocolEvent::PositionClosed {
                id: id.clone(),
                reason: CloseReason::ByOwner,
            });
            Ok(collateral)
        })
    }

    /// Pay out everything the Surplus Escrow holds for `owner`
    pub fn claim_surplus(&self, state: &mut ProtocolState, owner: &Owner) -> ProtocolResult<Decimal> {
        state.atomically(|s| {
            let amount = s.escrow.claim(self.caller(), owner)?;
            s.wallets.push_collateral(owner, amount);

            tracing::info!(owner = %owner, amount = %amount, "Surplus claimed");
            s.emit(ProtocolEvent::SurplusClaimed {
                owner: owner.clone(),
                amount,
            });
            Ok(amount)
        })
    }
}
