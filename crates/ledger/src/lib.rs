//! CDP Position Ledger - system of record for every position
//!
//! - `Position`: stored collateral, debt, stake and reward snapshot
//! - `SortedPositions`: ordering by nominal collateral ratio, lowest first
//! - `RewardAccumulator`: lazy redistribution of liquidated debt/collateral
//! - `PositionLedger`: open / adjust / close plus reward application

pub mod ledger;
pub mod position;
pub mod rewards;
pub mod sorted;

pub use ledger::PositionLedger;
pub use position::{EntirePosition, PendingRewards, Position, RewardSnapshot};
pub use rewards::RewardAccumulator;
pub use sorted::SortedPositions;
