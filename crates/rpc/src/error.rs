//! Command errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] cdp_core::ProtocolError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] cdp_oracle::OracleError),

    #[error("Event store error: {0}")]
    Event(#[from] cdp_events::EventError),

    #[error("Invalid identifier: {0}")]
    Identity(#[from] cdp_core::IdError),

    #[error("Invalid amount: {0}")]
    Amount(#[from] cdp_core::AmountError),

    #[error("State file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}
