//! CDP Lifecycle Manager
//!
//! Owns the shared `ProtocolState` and the two system-initiated flows:
//!
//! - **Liquidation**: close positions below the minimum ratio, offsetting
//!   their debt against the Stability Reserve and redistributing the rest
//! - **Redemption**: exchange stable asset for collateral at face value,
//!   drawing from the lowest-ratio positions first
//!
//! Every public entry point runs inside `ProtocolState::atomically`.

pub mod liquidation;
pub mod manager;
pub mod redemption;
pub mod state;

pub use liquidation::{LiquidatedPosition, LiquidationSummary};
pub use manager::LifecycleManager;
pub use redemption::{RedeemedLot, RedemptionRequest, RedemptionSummary};
pub use state::ProtocolState;
