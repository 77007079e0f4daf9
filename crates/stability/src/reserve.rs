//! Stability Reserve state and the offset algorithm

use std::collections::BTreeMap;

use cdp_core::{Caller, Owner, ProtocolError, Role};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::deposit::{Deposit, DepositSnapshot};

/// Decimal places kept by the per-unit accumulators
const PRECISION_DP: u32 = 18;

/// Rescaling factor applied to `P` when it would drop below `1 / SCALE_FACTOR`
pub const SCALE_FACTOR: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// 1e-9
const P_THRESHOLD: Decimal = Decimal::from_parts(1, 0, 0, false, 9);

fn round_down(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRECISION_DP, RoundingStrategy::ToZero)
}

fn round_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRECISION_DP, RoundingStrategy::AwayFromZero)
}

/// What a deposit or withdrawal moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReserveReceipt {
    /// Depositor's value after the operation
    pub deposit: Decimal,
    /// Stable asset returned to the depositor
    pub withdrawn: Decimal,
    /// Collateral gain paid out to the depositor
    pub collateral_gain: Decimal,
}

/// Accumulator position after an offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetOutcome {
    pub epoch: u64,
    pub scale: u64,
    pub p: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityReserve {
    deposits: BTreeMap<Owner, Deposit>,
    total_deposits: Decimal,
    /// Collateral gains held for depositors
    collateral: Decimal,
    p: Decimal,
    /// S per epoch, then per scale
    sums: BTreeMap<u64, BTreeMap<u64, Decimal>>,
    current_epoch: u64,
    current_scale: u64,
    last_collateral_error: Decimal,
    last_debt_loss_error: Decimal,
}

impl Default for StabilityReserve {
    fn default() -> Self {
        Self {
            deposits: BTreeMap::new(),
            total_deposits: Decimal::ZERO,
            collateral: Decimal::ZERO,
            p: Decimal::ONE,
            sums: BTreeMap::new(),
            current_epoch: 0,
            current_scale: 0,
            last_collateral_error: Decimal::ZERO,
            last_debt_loss_error: Decimal::ZERO,
        }
    }
}

impl StabilityReserve {
    pub fn new() -> Self {
        Self::default()
    }

    // === Reads ===

    pub fn total_deposits(&self) -> Decimal {
        self.total_deposits
    }

    pub fn collateral_balance(&self) -> Decimal {
        self.collateral
    }

    pub fn product(&self) -> Decimal {
        self.p
    }

    pub fn epoch(&self) -> u64 {
        self.current_epoch
    }

    pub fn scale(&self) -> u64 {
        self.current_scale
    }

    pub fn deposit_of(&self, depositor: &Owner) -> Option<&Deposit> {
        self.deposits.get(depositor)
    }

    pub fn depositors(&self) -> impl Iterator<Item = &Owner> {
        self.deposits.keys()
    }

    /// Current value of a deposit after all absorbed debt
    pub fn compounded_deposit(&self, depositor: &Owner) -> Decimal {
        self.deposits
            .get(depositor)
            .map(|d| self.compounded_value(d))
            .unwrap_or(Decimal::ZERO)
    }

    /// Collateral earned by a deposit since its snapshot
    pub fn collateral_gain(&self, depositor: &Owner) -> Decimal {
        self.deposits
            .get(depositor)
            .map(|d| self.gain_of(d))
            .unwrap_or(Decimal::ZERO)
    }

    fn sum_at(&self, epoch: u64, scale: u64) -> Decimal {
        self.sums
            .get(&epoch)
            .and_then(|scales| scales.get(&scale))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn current_snapshot(&self) -> DepositSnapshot {
        DepositSnapshot {
            p: self.p,
            s: self.sum_at(self.current_epoch, self.current_scale),
            epoch: self.current_epoch,
            scale: self.current_scale,
        }
    }

    fn compounded_value(&self, deposit: &Deposit) -> Decimal {
        let snapshot = &deposit.snapshot;
        if deposit.initial.is_zero() || snapshot.p.is_zero() || snapshot.epoch < self.current_epoch {
            return Decimal::ZERO;
        }

        let compounded = match self.current_scale.saturating_sub(snapshot.scale) {
            0 => deposit.initial * self.p / snapshot.p,
            1 => deposit.initial * self.p / snapshot.p / SCALE_FACTOR,
            _ => Decimal::ZERO,
        };
        let compounded = round_down(compounded);

        // below a billionth of the original it is rounding noise
        if compounded < deposit.initial / SCALE_FACTOR {
            return Decimal::ZERO;
        }
        compounded
    }

    fn gain_of(&self, deposit: &Deposit) -> Decimal {
        let snapshot = &deposit.snapshot;
        if deposit.initial.is_zero() || snapshot.p.is_zero() {
            return Decimal::ZERO;
        }

        // gains recorded after the deposit's scale moved on count one scale down
        let first = self.sum_at(snapshot.epoch, snapshot.scale) - snapshot.s;
        let second = self.sum_at(snapshot.epoch, snapshot.scale + 1) / SCALE_FACTOR;

        round_down(deposit.initial * (first + second) / snapshot.p).min(self.collateral)
    }

    // === Mutations ===

    /// Add to a deposit. Any accrued collateral gain is paid out first and the
    /// deposit is re-snapshotted at its compounded value plus `amount`.
    pub fn provide(
        &mut self,
        caller: &Caller,
        depositor: &Owner,
        amount: Decimal,
    ) -> Result<ReserveReceipt, ProtocolError> {
        caller.require(&[Role::PositionOperations])?;
        if amount <= Decimal::ZERO {
            return Err(ProtocolError::invalid_amount("deposit", "must be positive"));
        }

        let compounded = self.compounded_deposit(depositor);
        let gain = self.collateral_gain(depositor);

        let deposit = compounded + amount;
        self.collateral -= gain;
        self.total_deposits += amount;
        let snapshot = self.current_snapshot();
        self.deposits.insert(depositor.clone(), Deposit::new(deposit, snapshot));

        tracing::debug!(
            depositor = %depositor,
            amount = %amount,
            deposit = %deposit,
            gain = %gain,
            "Reserve deposit"
        );

        Ok(ReserveReceipt {
            deposit,
            withdrawn: Decimal::ZERO,
            collateral_gain: gain,
        })
    }

    /// Withdraw up to `amount` of the compounded deposit and all collateral
    /// gain. A zero amount only collects the gain.
    pub fn withdraw(
        &mut self,
        caller: &Caller,
        depositor: &Owner,
        amount: Decimal,
    ) -> Result<ReserveReceipt, ProtocolError> {
        caller.require(&[Role::PositionOperations])?;
        if amount.is_sign_negative() {
            return Err(ProtocolError::invalid_amount("withdrawal", "must not be negative"));
        }

        let deposit = self
            .deposits
            .get(depositor)
            .ok_or_else(|| ProtocolError::InsufficientFunds {
                account: depositor.to_string(),
                asset: "reserve deposit",
                available: Decimal::ZERO,
                required: amount,
            })?;

        let compounded = self.compounded_value(deposit);
        let gain = self.gain_of(deposit);
        let withdrawn = amount.min(compounded);
        let remaining = compounded - withdrawn;

        self.total_deposits = (self.total_deposits - withdrawn).max(Decimal::ZERO);
        self.collateral -= gain;

        if remaining.is_zero() {
            self.deposits.remove(depositor);
        } else {
            let snapshot = self.current_snapshot();
            self.deposits.insert(depositor.clone(), Deposit::new(remaining, snapshot));
        }

        tracing::debug!(
            depositor = %depositor,
            withdrawn = %withdrawn,
            remaining = %remaining,
            gain = %gain,
            "Reserve withdrawal"
        );

        Ok(ReserveReceipt {
            deposit: remaining,
            withdrawn,
            collateral_gain: gain,
        })
    }

    /// Absorb `debt` from the deposits and take `collateral` in exchange
    ///
    /// The loss per unit is rounded up and the gain per unit rounded down, with
    /// the rounding error carried into the next offset, so depositors can never
    /// claim more than the reserve holds.
    pub fn offset(
        &mut self,
        caller: &Caller,
        debt: Decimal,
        collateral: Decimal,
    ) -> Result<OffsetOutcome, ProtocolError> {
        caller.require(&[Role::LifecycleManager])?;
        if debt.is_sign_negative() || collateral.is_sign_negative() {
            return Err(ProtocolError::invalid_amount("offset", "must not be negative"));
        }
        if debt > self.total_deposits {
            return Err(ProtocolError::InsufficientFunds {
                account: "STABILITY_RESERVE".to_string(),
                asset: "stable",
                available: self.total_deposits,
                required: debt,
            });
        }
        if debt.is_zero() {
            return Ok(self.outcome());
        }

        let total = self.total_deposits;

        let collateral_numerator = collateral + self.last_collateral_error;
        let gain_per_unit = round_down(collateral_numerator / total);
        self.last_collateral_error = collateral_numerator - gain_per_unit * total;

        let loss_per_unit = if debt == total {
            self.last_debt_loss_error = Decimal::ZERO;
            Decimal::ONE
        } else {
            let loss_numerator = debt - self.last_debt_loss_error;
            let per_unit = round_up(loss_numerator / total).min(Decimal::ONE);
            self.last_debt_loss_error = per_unit * total - loss_numerator;
            per_unit
        };

        self.update_sum_and_product(gain_per_unit, loss_per_unit);

        self.total_deposits = total - debt;
        self.collateral += collateral;

        tracing::debug!(
            debt = %debt,
            collateral = %collateral,
            epoch = self.current_epoch,
            scale = self.current_scale,
            p = %self.p,
            "Reserve offset"
        );

        Ok(self.outcome())
    }

    fn update_sum_and_product(&mut self, gain_per_unit: Decimal, loss_per_unit: Decimal) {
        let marginal_gain = round_down(gain_per_unit * self.p);
        *self
            .sums
            .entry(self.current_epoch)
            .or_default()
            .entry(self.current_scale)
            .or_insert(Decimal::ZERO) += marginal_gain;

        let factor = Decimal::ONE - loss_per_unit;
        if factor.is_zero() {
            self.start_new_epoch();
            return;
        }

        let raw = self.p * factor;
        if raw < P_THRESHOLD {
            self.p = round_down(raw * SCALE_FACTOR);
            self.current_scale += 1;
        } else {
            self.p = round_down(raw);
        }

        if self.p.is_zero() {
            self.start_new_epoch();
        }
    }

    fn start_new_epoch(&mut self) {
        self.current_epoch += 1;
        self.current_scale = 0;
        self.p = Decimal::ONE;
    }

    fn outcome(&self) -> OffsetOutcome {
        OffsetOutcome {
            epoch: self.current_epoch,
            scale: self.current_scale,
            p: self.p,
        }
    }
}
