//! CDP Stability Reserve
//!
//! Depositors pool stable asset that absorbs the debt of liquidated positions
//! in exchange for a pro-rata share of their collateral.
//!
//! Bookkeeping is O(1) per depositor:
//! - a running product `P` tracks how much of an initial deposit survives
//! - a running sum `S` per (epoch, scale) tracks collateral gained per unit
//! - each deposit stores a snapshot of both and derives its current value
//!
//! A full wipe-out starts a new epoch; when `P` would lose precision it is
//! rescaled and the scale counter advances.

pub mod deposit;
pub mod reserve;

pub use deposit::{Deposit, DepositSnapshot};
pub use reserve::{OffsetOutcome, ReserveReceipt, StabilityReserve, SCALE_FACTOR};
