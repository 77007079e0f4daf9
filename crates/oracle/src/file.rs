//! File-backed oracle: the last published price lives in a JSON file

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

use crate::error::OracleError;
use crate::types::{AssetPair, Price, PriceOracle};

pub struct FileOracle {
    pair: AssetPair,
    path: PathBuf,
}

impl FileOracle {
    pub fn new(path: impl AsRef<Path>, pair: AssetPair) -> Self {
        Self {
            pair,
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stamp `value` with the current time and persist it
    pub async fn publish(&self, value: Decimal) -> Result<Price, OracleError> {
        let price = Price::new(self.pair.clone(), value, "file")?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&price)?;
        tokio::fs::write(&self.path, json).await?;

        tracing::info!(pair = %price.pair, price = %price.value, "Price published");
        Ok(price)
    }
}

#[async_trait]
impl PriceOracle for FileOracle {
    fn pair(&self) -> &AssetPair {
        &self.pair
    }

    async fn latest_price(&self) -> Result<Price, OracleError> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Err(OracleError::PriceUnavailable {
                pair: self.pair.to_string(),
            });
        }
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let price: Price = serde_json::from_str(&raw)?;
        if price.value <= Decimal::ZERO {
            return Err(OracleError::InvalidPrice {
                pair: price.pair.to_string(),
                reason: format!("{} is not positive", price.value),
            });
        }
        Ok(price)
    }
}
