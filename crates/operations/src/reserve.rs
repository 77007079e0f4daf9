//! Stability Reserve deposits and withdrawals

use cdp_core::math::require_valid_price;
use cdp_core::{Owner, ProtocolError, ProtocolEvent, ProtocolResult};
use cdp_lifecycle::ProtocolState;
use cdp_stability::ReserveReceipt;
use rust_decimal::Decimal;

use crate::operations::PositionOperations;

impl PositionOperations {
    /// Move stable asset from the depositor's wallet into the reserve. Any
    /// collateral gain accrued so far is paid out first.
    pub fn provide_to_reserve(
        &self,
        state: &mut ProtocolState,
        depositor: &Owner,
        amount: Decimal,
    ) -> ProtocolResult<ReserveReceipt> {
        if amount <= Decimal::ZERO {
            return Err(ProtocolError::invalid_amount("deposit", "must be positive"));
        }

        state.atomically(|s| {
            s.wallets.burn_stable(depositor, amount)?;
            let receipt = s.reserve.provide(self.caller(), depositor, amount)?;
            s.wallets.push_collateral(depositor, receipt.collateral_gain);

            tracing::info!(
                depositor = %depositor,
                amount = %amount,
                deposit = %receipt.deposit,
                gain = %receipt.collateral_gain,
                "Reserve deposit"
            );
            s.emit(ProtocolEvent::ReserveDeposit {
                depositor: depositor.clone(),
                deposit: receipt.deposit,
                collateral_gain_paid: receipt.collateral_gain,
            });
            Ok(receipt)
        })
    }

    /// Withdraw up to `amount` of the compounded deposit plus all collateral
    /// gain. Blocked while any position sits below the minimum ratio.
    pub fn withdraw_from_reserve(
        &self,
        state: &mut ProtocolState,
        depositor: &Owner,
        amount: Decimal,
        price: Decimal,
    ) -> ProtocolResult<ReserveReceipt> {
        let price = require_valid_price(price)?;

        state.atomically(|s| {
            if !amount.is_zero() && s.has_undercollateralized_positions(price) {
                return Err(ProtocolError::UnderCollateralizedPositions);
            }

            let receipt = s.reserve.withdraw(self.caller(), depositor, amount)?;
            s.wallets.mint_stable(depositor, receipt.withdrawn);
            s.wallets.push_collateral(depositor, receipt.collateral_gain);

            tracing::info!(
                depositor = %depositor,
                withdrawn = %receipt.withdrawn,
                remaining = %receipt.deposit,
                gain = %receipt.collateral_gain,
                "Reserve withdrawal"
            );
            s.emit(ProtocolEvent::ReserveWithdrawal {
                depositor: depositor.clone(),
                withdrawn: receipt.withdrawn,
                remaining: receipt.deposit,
                collateral_gain_paid: receipt.collateral_gain,
            });
            Ok(receipt)
        })
    }
}
