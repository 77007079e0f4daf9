//! Oracle error types

use thiserror::Error;

/// Oracle-related errors
#[derive(Debug, Error)]
pub enum OracleError {
    /// No price has been published yet
    #[error("No price available for {pair}")]
    PriceUnavailable { pair: String },

    /// Price data is older than the accepted age
    #[error("Stale price for {pair}: last update was {last_update}, threshold is {threshold_secs}s")]
    StalePrice {
        pair: String,
        last_update: String,
        threshold_secs: u64,
    },

    #[error("Invalid price for {pair}: {reason}")]
    InvalidPrice { pair: String, reason: String },

    #[error("Price feed I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Price feed data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}
