//! Per-depositor record

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reserve accumulators captured when a deposit was last touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositSnapshot {
    pub p: Decimal,
    pub s: Decimal,
    pub epoch: u64,
    pub scale: u64,
}

/// A depositor's stake in the reserve
///
/// `initial` is the value at the last deposit or withdrawal. The current value
/// and collateral gain are derived from it and the snapshot on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub initial: Decimal,
    pub snapshot: DepositSnapshot,
}

impl Deposit {
    pub fn new(initial: Decimal, snapshot: DepositSnapshot) -> Self {
        Self { initial, snapshot }
    }
}
