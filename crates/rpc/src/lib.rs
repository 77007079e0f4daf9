//! CDP RPC - CLI orchestrator
//!
//! This crate provides the `cdp` binary and command orchestration over a
//! persisted protocol state.

pub mod commands;
pub mod context;
pub mod error;

pub use context::AppContext;
pub use error::CommandError;
