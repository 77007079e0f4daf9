//! Core oracle types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::OracleError;

/// The collateral asset quoted in the stable asset (e.g., ETH/USD)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPair {
    pub collateral: String,
    pub quote: String,
}

impl AssetPair {
    pub fn new(collateral: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            collateral: collateral.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }
}

impl Default for AssetPair {
    fn default() -> Self {
        Self::new("COLL", "STABLE")
    }
}

impl std::fmt::Display for AssetPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collateral, self.quote)
    }
}

/// A price quote with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub pair: AssetPair,
    /// Units of the stable asset per unit of collateral
    pub value: Decimal,
    /// When this price was published
    pub timestamp: DateTime<Utc>,
    /// Source of the price (e.g., "mock", "file")
    pub source: String,
}

impl Price {
    /// Validate and stamp a new quote
    pub fn new(pair: AssetPair, value: Decimal, source: impl Into<String>) -> Result<Self, OracleError> {
        if value <= Decimal::ZERO {
            return Err(OracleError::InvalidPrice {
                pair: pair.to_string(),
                reason: format!("{} is not positive", value),
            });
        }
        Ok(Self {
            pair,
            value,
            timestamp: Utc::now(),
            source: source.into(),
        })
    }

    /// Age in whole seconds
    pub fn age_secs(&self) -> i64 {
        Utc::now().signed_duration_since(self.timestamp).num_seconds()
    }

    /// Check if price is stale (older than threshold)
    pub fn is_stale(&self, max_age_secs: u64) -> bool {
        self.age_secs() > max_age_secs as i64
    }
}

/// Price Oracle trait - interface for collateral price feeds
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// The pair this oracle quotes
    fn pair(&self) -> &AssetPair;

    /// Latest published price, however old
    async fn latest_price(&self) -> Result<Price, OracleError>;

    /// Latest price, rejected when older than `max_age_secs`
    async fn fresh_price(&self, max_age_secs: u64) -> Result<Price, OracleError> {
        let price = self.latest_price().await?;
        if price.is_stale(max_age_secs) {
            return Err(OracleError::StalePrice {
                pair: price.pair.to_string(),
                last_update: price.timestamp.to_rfc3339(),
                threshold_secs: max_age_secs,
            });
        }
        Ok(price)
    }
}
