//! Position Ledger

use std::collections::BTreeMap;

use cdp_core::math::nominal_ratio;
use cdp_core::{Caller, CloseReason, Owner, PositionId, PositionStatus, ProtocolError, Role};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::position::{EntirePosition, PendingRewards, Position};
use crate::rewards::RewardAccumulator;
use crate::sorted::SortedPositions;

/// Every position ever opened, the ordering of the active ones and the
/// redistribution accumulator.
///
/// A position is Active exactly when it holds collateral and debt and is
/// present in the ordering. Closed positions are kept so their identifier can
/// never be reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionLedger {
    positions: BTreeMap<PositionId, Position>,
    sorted: SortedPositions,
    rewards: RewardAccumulator,
}

const WRITERS: &[Role] = &[Role::PositionOperations, Role::LifecycleManager];

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // === Reads ===

    pub fn get(&self, id: &PositionId) -> Option<&Position> {
        self.positions.get(id)
    }

    pub fn status(&self, id: &PositionId) -> PositionStatus {
        self.positions
            .get(id)
            .map(|p| p.status)
            .unwrap_or(PositionStatus::Nonexistent)
    }

    pub fn active_count(&self) -> usize {
        self.sorted.len()
    }

    pub fn rewards(&self) -> &RewardAccumulator {
        &self.rewards
    }

    pub fn total_stakes(&self) -> Decimal {
        self.rewards.total_stakes
    }

    /// Active positions from lowest to highest ratio
    pub fn iter_ascending(&self) -> impl DoubleEndedIterator<Item = &PositionId> {
        self.sorted.iter()
    }

    pub fn lowest(&self) -> Option<&PositionId> {
        self.sorted.first()
    }

    pub fn is_ranked(&self, id: &PositionId) -> bool {
        self.sorted.contains(id)
    }

    pub fn positions_of<'a>(&'a self, owner: &'a Owner) -> impl Iterator<Item = &'a Position> + 'a {
        self.positions.values().filter(move |p| &p.id.owner == owner)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// First index never used by `owner`
    pub fn next_index(&self, owner: &Owner) -> u32 {
        self.positions_of(owner)
            .map(|p| p.id.index + 1)
            .max()
            .unwrap_or(0)
    }

    /// Sum of stored collateral and debt over active positions
    pub fn active_totals(&self) -> (Decimal, Decimal) {
        self.positions
            .values()
            .filter(|p| p.is_active())
            .fold((Decimal::ZERO, Decimal::ZERO), |(c, d), p| (c + p.collateral, d + p.debt))
    }

    fn active(&self, id: &PositionId) -> Result<&Position, ProtocolError> {
        match self.positions.get(id) {
            None => Err(ProtocolError::NotFound(id.to_string())),
            Some(p) if !p.is_active() => Err(ProtocolError::NotActive(id.to_string())),
            Some(p) => Ok(p),
        }
    }

    fn active_mut(&mut self, id: &PositionId) -> Result<&mut Position, ProtocolError> {
        match self.positions.get_mut(id) {
            None => Err(ProtocolError::NotFound(id.to_string())),
            Some(p) if !p.is_active() => Err(ProtocolError::NotActive(id.to_string())),
            Some(p) => Ok(p),
        }
    }

    /// Redistribution rewards not yet applied; zero for inactive positions
    pub fn pending_rewards(&self, id: &PositionId) -> PendingRewards {
        match self.positions.get(id) {
            Some(p) if p.is_active() => self.rewards.pending(p.stake, &p.snapshot),
            _ => PendingRewards::default(),
        }
    }

    /// Stored values plus pending rewards
    pub fn entire_position(&self, id: &PositionId) -> Result<EntirePosition, ProtocolError> {
        let position = self.active(id)?;
        let pending = self.rewards.pending(position.stake, &position.snapshot);
        Ok(EntirePosition {
            id: id.clone(),
            collateral: position.collateral + pending.collateral,
            debt: position.debt + pending.debt,
            pending,
        })
    }

    fn rerank(&mut self, id: &PositionId) -> Result<(), ProtocolError> {
        let entire = self.entire_position(id)?;
        self.sorted.insert(id.clone(), entire.nominal_ratio());
        Ok(())
    }

    // === Mutations ===

    /// Create an Active position and rank it
    ///
    /// `gas_compensation` is the part of `debt` held by the Gas Pool.
    pub fn open(
        &mut self,
        caller: &Caller,
        id: &PositionId,
        collateral: Decimal,
        debt: Decimal,
        gas_compensation: Decimal,
    ) -> Result<&Position, ProtocolError> {
        caller.require(&[Role::PositionOperations])?;

        if let Some(existing) = self.positions.get(id) {
            return Err(if existing.is_active() {
                ProtocolError::AlreadyExists(id.to_string())
            } else {
                ProtocolError::AlreadyClosed(id.to_string())
            });
        }
        if collateral <= Decimal::ZERO {
            return Err(ProtocolError::invalid_amount("collateral", "must be positive"));
        }
        if debt <= Decimal::ZERO {
            return Err(ProtocolError::invalid_amount("debt", "must be positive"));
        }
        if gas_compensation < Decimal::ZERO || gas_compensation >= debt {
            return Err(ProtocolError::invalid_amount(
                "gas_compensation",
                format!("{} must be below the debt {}", gas_compensation, debt),
            ));
        }

        let stake = self.rewards.compute_stake(collateral);
        self.rewards.add_stake(stake);
        self.sorted.insert(id.clone(), nominal_ratio(collateral, debt));

        let position = Position {
            id: id.clone(),
            collateral,
            debt,
            gas_compensation,
            stake,
            snapshot: self.rewards.current_snapshot(),
            status: PositionStatus::Active,
        };
        tracing::debug!(position = %id, collateral = %collateral, debt = %debt, stake = %stake, "Position stored");

        Ok(&*self.positions.entry(id.clone()).or_insert(position))
    }

    /// Apply signed deltas to an Active position, refresh its stake and re-rank it
    ///
    /// Callers apply pending rewards first.
    pub fn adjust(
        &mut self,
        caller: &Caller,
        id: &PositionId,
        collateral_delta: Decimal,
        debt_delta: Decimal,
    ) -> Result<&Position, ProtocolError> {
        caller.require(WRITERS)?;

        let position = self.active(id)?;
        let collateral = position.collateral + collateral_delta;
        let debt = position.debt + debt_delta;
        let old_stake = position.stake;

        if collateral <= Decimal::ZERO {
            return Err(ProtocolError::invalid_amount(
                "collateral",
                format!("adjustment leaves {}", collateral),
            ));
        }
        if debt <= Decimal::ZERO {
            return Err(ProtocolError::invalid_amount(
                "debt",
                format!("adjustment leaves {}", debt),
            ));
        }

        let stake = self.rewards.compute_stake(collateral);
        self.rewards.remove_stake(old_stake);
        self.rewards.add_stake(stake);

        let position = self.active_mut(id)?;
        position.collateral = collateral;
        position.debt = debt;
        position.stake = stake;

        self.rerank(id)?;
        self.active(id)
    }

    /// Move pending rewards into the stored values
    ///
    /// The caller moves the matching amounts from the Default Pool to the
    /// Active Pool.
    pub fn apply_pending_rewards(
        &mut self,
        caller: &Caller,
        id: &PositionId,
    ) -> Result<PendingRewards, ProtocolError> {
        caller.require(WRITERS)?;

        let position = self.active(id)?;
        let pending = self.rewards.pending(position.stake, &position.snapshot);
        let snapshot = self.rewards.current_snapshot();

        let position = self.active_mut(id)?;
        position.collateral += pending.collateral;
        position.debt += pending.debt;
        position.snapshot = snapshot;

        if !pending.is_zero() {
            self.rerank(id)?;
        }
        Ok(pending)
    }

    /// Zero the position, mark it closed and drop it from the ordering
    ///
    /// Returns the position as it stood before closing. Callers apply pending
    /// rewards first.
    pub fn close(
        &mut self,
        caller: &Caller,
        id: &PositionId,
        reason: CloseReason,
    ) -> Result<Position, ProtocolError> {
        caller.require(WRITERS)?;

        let position = match self.positions.get_mut(id) {
            None => return Err(ProtocolError::NotFound(id.to_string())),
            Some(p) if p.status.is_closed() => {
                return Err(ProtocolError::AlreadyClosed(id.to_string()))
            }
            Some(p) => p,
        };

        let before = position.clone();
        position.collateral = Decimal::ZERO;
        position.debt = Decimal::ZERO;
        position.gas_compensation = Decimal::ZERO;
        position.stake = Decimal::ZERO;
        position.status = reason.into();

        self.rewards.remove_stake(before.stake);
        self.sorted.remove(id);

        tracing::debug!(position = %id, reason = ?reason, "Position closed");
        Ok(before)
    }

    /// Share `debt` and `collateral` across all remaining stakes
    pub fn redistribute(
        &mut self,
        caller: &Caller,
        debt: Decimal,
        collateral: Decimal,
    ) -> Result<&RewardAccumulator, ProtocolError> {
        caller.require(&[Role::LifecycleManager])?;
        self.rewards.distribute(debt, collateral)?;
        Ok(&self.rewards)
    }

    /// Record stakes and system collateral after a liquidation batch
    ///
    /// `unowned` is what the Default Pool holds as (debt, collateral). Once
    /// no active stake remains it is carried into the next redistribution.
    pub fn update_system_snapshots(
        &mut self,
        caller: &Caller,
        total_collateral: Decimal,
        unowned: (Decimal, Decimal),
    ) -> Result<(), ProtocolError> {
        caller.require(&[Role::LifecycleManager])?;
        let (debt, collateral) = unowned;
        self.rewards.carry_unowned(debt, collateral);
        self.rewards.update_system_snapshots(total_collateral);
        Ok(())
    }
}
