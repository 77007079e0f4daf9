//! Ratio helpers shared by the ledger, lifecycle and operations

use rust_decimal::Decimal;

use crate::error::ProtocolError;

/// Collateral ratio at `price`: coll * price / debt.
///
/// A position with no debt has an unbounded ratio, represented as `Decimal::MAX`.
pub fn collateral_ratio(coll: Decimal, debt: Decimal, price: Decimal) -> Decimal {
    if debt <= Decimal::ZERO {
        return Decimal::MAX;
    }
    coll * price / debt
}

/// Price-independent ratio used to rank positions: coll / debt
pub fn nominal_ratio(coll: Decimal, debt: Decimal) -> Decimal {
    if debt <= Decimal::ZERO {
        return Decimal::MAX;
    }
    coll / debt
}

/// Reject a missing or non-positive oracle price
pub fn require_valid_price(price: Decimal) -> Result<Decimal, ProtocolError> {
    if price <= Decimal::ZERO {
        return Err(ProtocolError::InvalidPrice(price));
    }
    Ok(price)
}
