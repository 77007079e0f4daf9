//! CDP Core - Domain types shared by every engine component
//!
//! - `Amount`: non-negative decimal wrapper
//! - `Owner` / `PositionId`: identities
//! - `Caller` / `Role`: authenticated caller and component capabilities
//! - `ProtocolError`: the error taxonomy
//! - `ProtocolParams`: configurable thresholds, floors and caps
//! - `Wallets`: external account balances (asset transfer stand-in)
//! - `ProtocolEvent`: events emitted by committed operations

pub mod amount;
pub mod auth;
pub mod config;
pub mod error;
pub mod event;
pub mod id;
pub mod math;
pub mod status;
pub mod wallet;

pub use amount::{Amount, AmountError};
pub use auth::{Caller, Role};
pub use config::ProtocolParams;
pub use error::{ProtocolError, ProtocolResult};
pub use event::ProtocolEvent;
pub use id::{IdError, Owner, PositionId};
pub use status::{CloseReason, PositionStatus};
pub use wallet::{WalletBalance, Wallets};
