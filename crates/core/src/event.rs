//! Protocol events
//!
//! Operations push events into the state's buffer; the buffer is part of the
//! transaction, so a reverted operation emits nothing. The surrounding context
//! drains and persists them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::id::{Owner, PositionId};
use crate::status::CloseReason;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolEvent {
    PositionOpened {
        id: PositionId,
        collateral: Decimal,
        debt: Decimal,
        borrowing_fee: Decimal,
    },
    PositionAdjusted {
        id: PositionId,
        collateral: Decimal,
        debt: Decimal,
        borrowing_fee: Decimal,
    },
    PositionClosed {
        id: PositionId,
        reason: CloseReason,
    },
    PositionLiquidated {
        id: PositionId,
        debt: Decimal,
        collateral: Decimal,
        debt_offset: Decimal,
        collateral_to_reserve: Decimal,
        debt_redistributed: Decimal,
        collateral_redistributed: Decimal,
        surplus: Decimal,
    },
    Liquidation {
        liquidator: Owner,
        positions: usize,
        debt_offset: Decimal,
        debt_redistributed: Decimal,
        gas_compensation: Decimal,
    },
    Redistribution {
        debt: Decimal,
        collateral: Decimal,
        l_debt: Decimal,
        l_collateral: Decimal,
    },
    Redemption {
        redeemer: Owner,
        attempted: Decimal,
        redeemed: Decimal,
        collateral_sent: Decimal,
        collateral_fee: Decimal,
        positions: usize,
    },
    SurplusCredited {
        owner: Owner,
        amount: Decimal,
        balance: Decimal,
    },
    SurplusClaimed {
        owner: Owner,
        amount: Decimal,
    },
    ReserveDeposit {
        depositor: Owner,
        deposit: Decimal,
        collateral_gain_paid: Decimal,
    },
    ReserveWithdrawal {
        depositor: Owner,
        withdrawn: Decimal,
        remaining: Decimal,
        collateral_gain_paid: Decimal,
    },
    ReserveOffset {
        debt: Decimal,
        collateral: Decimal,
        epoch: u64,
        scale: u64,
    },
}

impl ProtocolEvent {
    /// Short name for logs and CLI listings
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolEvent::PositionOpened { .. } => "position_opened",
            ProtocolEvent::PositionAdjusted { .. } => "position_adjusted",
            ProtocolEvent::PositionClosed { .. } => "position_closed",
            ProtocolEvent::PositionLiquidated { .. } => "position_liquidated",
            ProtocolEvent::Liquidation { .. } => "liquidation",
            ProtocolEvent::Redistribution { .. } => "redistribution",
            ProtocolEvent::Redemption { .. } => "redemption",
            ProtocolEvent::SurplusCredited { .. } => "surplus_credited",
            ProtocolEvent::SurplusClaimed { .. } => "surplus_claimed",
            ProtocolEvent::ReserveDeposit { .. } => "reserve_deposit",
            ProtocolEvent::ReserveWithdrawal { .. } => "reserve_withdrawal",
            ProtocolEvent::ReserveOffset { .. } => "reserve_offset",
        }
    }
}
