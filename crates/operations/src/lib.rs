//! CDP Position Operations - the user-facing entry points
//!
//! Each call takes the authenticated owner, runs as one transaction over the
//! `ProtocolState` and moves assets only through the pools and wallets.
//!
//! - positions: open, adjust, close, claim surplus
//! - Stability Reserve: provide, withdraw

pub mod operations;
pub mod reserve;

pub use operations::{AdjustRequest, PositionOperations};
