//! Shared protocol state and the transaction boundary

use cdp_core::math::collateral_ratio;
use cdp_core::{Caller, PositionId, ProtocolEvent, ProtocolParams, ProtocolResult, Role, Wallets};
use cdp_ledger::{PendingRewards, PositionLedger};
use cdp_pools::{ActivePool, DefaultPool, GasPool, SurplusEscrow};
use cdp_stability::StabilityReserve;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything the engine owns, passed explicitly by `&mut`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtocolState {
    #[serde(default)]
    pub params: ProtocolParams,
    pub wallets: Wallets,
    pub active: ActivePool,
    pub default: DefaultPool,
    pub gas: GasPool,
    pub escrow: SurplusEscrow,
    pub reserve: StabilityReserve,
    pub ledger: PositionLedger,
    /// Events of the current, not yet persisted, operations
    #[serde(skip)]
    events: Vec<ProtocolEvent>,
}

impl ProtocolState {
    pub fn new(params: ProtocolParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Run `op` as one transaction: on error every change it made, including
    /// emitted events, is discarded.
    pub fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut ProtocolState) -> ProtocolResult<T>,
    ) -> ProtocolResult<T> {
        let checkpoint = self.clone();
        match op(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                *self = checkpoint;
                tracing::warn!(error = %e, "Operation reverted");
                Err(e)
            }
        }
    }

    pub fn emit(&mut self, event: ProtocolEvent) {
        tracing::debug!(kind = event.kind(), "Event emitted");
        self.events.push(event);
    }

    pub fn pending_events(&self) -> &[ProtocolEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<ProtocolEvent> {
        std::mem::take(&mut self.events)
    }

    // === System totals ===

    /// Collateral backing debt: Active plus Default Pool
    pub fn total_collateral(&self) -> Decimal {
        self.active.collateral() + self.default.collateral()
    }

    pub fn total_debt(&self) -> Decimal {
        self.active.debt() + self.default.debt()
    }

    /// Total collateral ratio
    pub fn tcr(&self, price: Decimal) -> Decimal {
        collateral_ratio(self.total_collateral(), self.total_debt(), price)
    }

    /// TCR after applying signed changes to system collateral and debt
    pub fn tcr_after(&self, collateral_delta: Decimal, debt_delta: Decimal, price: Decimal) -> Decimal {
        collateral_ratio(
            self.total_collateral() + collateral_delta,
            self.total_debt() + debt_delta,
            price,
        )
    }

    pub fn is_recovery_mode(&self, price: Decimal) -> bool {
        self.tcr(price) < self.params.ccr
    }

    /// Whether the lowest-ranked position sits below the minimum ratio
    pub fn has_undercollateralized_positions(&self, price: Decimal) -> bool {
        self.ledger
            .lowest()
            .and_then(|id| self.ledger.entire_position(id).ok())
            .map(|p| p.collateral_ratio(price) < self.params.mcr)
            .unwrap_or(false)
    }

    /// Move a position's redistribution rewards into its stored values and
    /// the matching amounts from the Default Pool to the Active Pool.
    pub fn apply_pending_rewards(&mut self, role: Role, id: &PositionId) -> ProtocolResult<PendingRewards> {
        let caller = Caller::from(role);
        let pending = self.ledger.apply_pending_rewards(&caller, id)?;
        if pending.is_zero() {
            return Ok(pending);
        }

        self.default.decrease_debt(&caller, pending.debt)?;
        self.active.increase_debt(&caller, pending.debt)?;
        let moved = self.default.send_collateral_to_active(&caller, pending.collateral)?;
        self.active
            .receive_collateral(&Caller::from(Role::DefaultPool), moved)?;

        tracing::debug!(
            position = %id,
            collateral = %pending.collateral,
            debt = %pending.debt,
            "Pending rewards applied"
        );
        Ok(pending)
    }
}
