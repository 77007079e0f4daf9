//! CDP Pools - passive collateral/debt accumulators
//!
//! - `ActivePool`: collateral and debt backing open positions
//! - `DefaultPool`: liquidated collateral and debt awaiting redistribution
//! - `GasPool`: stable asset reserved as liquidation gas compensation
//! - `SurplusEscrow`: collateral owed to owners of closed positions
//!
//! Every mutating entry point takes the authenticated `Caller` and rejects
//! roles that are not part of the sanctioned transfer path.

pub mod active;
pub mod balance;
pub mod default;
pub mod gas;
pub mod surplus;

pub use active::ActivePool;
pub use balance::PoolBalance;
pub use default::DefaultPool;
pub use gas::GasPool;
pub use surplus::SurplusEscrow;
