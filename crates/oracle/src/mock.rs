//! Mock Oracle for testing
//!
//! Holds one settable price in memory.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::RwLock;

use crate::error::OracleError;
use crate::types::{AssetPair, Price, PriceOracle};

pub struct MockOracle {
    pair: AssetPair,
    price: RwLock<Option<Price>>,
}

impl MockOracle {
    /// Create an oracle with no price published
    pub fn new(pair: AssetPair) -> Self {
        Self {
            pair,
            price: RwLock::new(None),
        }
    }

    /// Create an oracle already quoting `value`
    pub fn with_price(value: Decimal) -> Result<Self, OracleError> {
        let oracle = Self::new(AssetPair::default());
        oracle.set_price(value)?;
        Ok(oracle)
    }

    pub fn set_price(&self, value: Decimal) -> Result<Price, OracleError> {
        let price = Price::new(self.pair.clone(), value, "mock")?;
        let mut slot = self.price.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(price.clone());
        Ok(price)
    }

    /// Replace the stored quote as-is, timestamp included
    pub fn set_quote(&self, price: Price) {
        let mut slot = self.price.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(price);
    }

    pub fn clear(&self) {
        let mut slot = self.price.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new(AssetPair::default())
    }
}

#[async_trait]
impl PriceOracle for MockOracle {
    fn pair(&self) -> &AssetPair {
        &self.pair
    }

    async fn latest_price(&self) -> Result<Price, OracleError> {
        let slot = self.price.read().unwrap_or_else(|e| e.into_inner());
        slot.clone().ok_or_else(|| OracleError::PriceUnavailable {
            pair: self.pair.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_oracle_set_price() {
        let oracle = MockOracle::default();
        assert!(matches!(
            oracle.latest_price().await,
            Err(OracleError::PriceUnavailable { .. })
        ));

        oracle.set_price(dec!(2000)).unwrap();
        let price = oracle.latest_price().await.unwrap();
        assert_eq!(price.value, dec!(2000));
        assert_eq!(price.source, "mock");
    }

    #[tokio::test]
    async fn test_mock_oracle_rejects_invalid_price() {
        let oracle = MockOracle::with_price(dec!(100)).unwrap();
        assert!(oracle.set_price(dec!(0)).is_err());

        // previous quote is kept
        assert_eq!(oracle.latest_price().await.unwrap().value, dec!(100));
    }

    #[tokio::test]
    async fn test_mock_oracle_fresh_price() {
        let oracle = MockOracle::with_price(dec!(100)).unwrap();
        assert!(oracle.fresh_price(60).await.is_ok());

        let mut old = oracle.latest_price().await.unwrap();
        old.timestamp = Utc::now() - Duration::minutes(10);
        oracle.set_quote(old);

        let result = oracle.fresh_price(60).await;
        assert!(matches!(result, Err(OracleError::StalePrice { threshold_secs: 60, .. })));
    }

    #[tokio::test]
    async fn test_mock_oracle_clear() {
        let oracle = MockOracle::with_price(dec!(100)).unwrap();
        oracle.clear();
        assert!(oracle.latest_price().await.is_err());
    }
}
