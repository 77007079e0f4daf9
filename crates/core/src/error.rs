//! Protocol error taxonomy
//!
//! Every error aborts the enclosing operation with no state change.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::amount::AmountError;
use crate::id::IdError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Caller {caller} is not authorized (requires {required})")]
    NotAuthorized { caller: String, required: String },

    #[error("Position not found: {0}")]
    NotFound(String),

    #[error("Position already exists: {0}")]
    AlreadyExists(String),

    #[error("Position already closed: {0}")]
    AlreadyClosed(String),

    #[error("Position is not active: {0}")]
    NotActive(String),

    #[error("Invalid amount for {field}: {reason}")]
    InvalidAmount {
        field: &'static str,
        reason: String,
    },

    #[error("No collateral available to claim for {0}")]
    NothingToClaim(String),

    #[error("Unable to redeem any amount")]
    NothingToRedeem,

    #[error("Nothing to liquidate")]
    NothingToLiquidate,

    #[error("Collateral ratio {ratio} is below the minimum {minimum}")]
    BelowMinimumRatio { ratio: Decimal, minimum: Decimal },

    #[error("Operation not permitted during Recovery Mode: {0}")]
    RecoveryModeRestriction(&'static str),

    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),

    #[error("Insufficient {asset} for {account}: available {available}, required {required}")]
    InsufficientFunds {
        account: String,
        asset: &'static str,
        available: Decimal,
        required: Decimal,
    },

    #[error("Cannot withdraw while there are positions below the liquidation threshold")]
    UnderCollateralizedPositions,

    #[error("No active stake left to receive a redistribution")]
    NoRedistributionTarget,

    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdError),
}

impl ProtocolError {
    pub fn invalid_amount(field: &'static str, reason: impl Into<String>) -> Self {
        ProtocolError::InvalidAmount {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
