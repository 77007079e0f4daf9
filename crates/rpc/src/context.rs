//! Application context - wires everything together

use cdp_core::{ProtocolParams, ProtocolResult};
use cdp_events::{EventRecord, EventStore};
use cdp_lifecycle::ProtocolState;
use cdp_oracle::{AssetPair, FileOracle, PriceOracle};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

use crate::error::CommandError;

/// Default accepted oracle price age in seconds
pub const DEFAULT_MAX_PRICE_AGE: u64 = 3600;

/// Application context - persisted state, price feed and event journal
///
/// Every command runs against one in-memory `ProtocolState`. A command that
/// succeeds has its events appended to the journal and the state written
/// back; one that fails leaves both files untouched.
pub struct AppContext {
    pub state: ProtocolState,
    pub event_store: EventStore,
    pub oracle: FileOracle,
    state_path: PathBuf,
    journal_path: PathBuf,
    max_price_age: u64,
}

impl AppContext {
    /// Open (or create) the data directory
    ///
    /// Parameters come from `config` when given, else from `config.json` in
    /// the data directory, else the defaults. An explicit config replaces the
    /// parameters of an existing state.
    pub async fn new(
        data_path: impl AsRef<Path>,
        config: Option<&Path>,
        max_price_age: u64,
    ) -> Result<Self, CommandError> {
        let data_path = data_path.as_ref();
        let journal_path = data_path.join("journal");
        let state_path = data_path.join("state.json");
        tokio::fs::create_dir_all(&journal_path).await?;

        let default_config = data_path.join("config.json");
        let params = match config {
            Some(path) => Some(ProtocolParams::from_file(path)?),
            None if default_config.exists() => Some(ProtocolParams::from_file(&default_config)?),
            None => None,
        };

        let state = if state_path.exists() {
            let raw = tokio::fs::read_to_string(&state_path).await?;
            let mut state: ProtocolState = serde_json::from_str(&raw)?;
            if let (Some(params), Some(_)) = (params.clone(), config) {
                tracing::info!(path = %state_path.display(), "Replacing protocol parameters");
                state.params = params;
            }
            state
        } else {
            tracing::info!(path = %state_path.display(), "Creating new protocol state");
            ProtocolState::new(params.unwrap_or_default())
        };

        Ok(Self {
            state,
            event_store: EventStore::new(&journal_path)?,
            oracle: FileOracle::new(data_path.join("oracle.json"), AssetPair::default()),
            state_path,
            journal_path,
            max_price_age,
        })
    }

    /// Current collateral price, rejected when missing or stale
    pub async fn price(&self) -> Result<Decimal, CommandError> {
        let price = self.oracle.fresh_price(self.max_price_age).await?;
        Ok(price.value)
    }

    /// Run one engine operation; on success journal its events and persist
    /// the state
    pub async fn commit<T, F>(&mut self, operation: F) -> Result<(T, Vec<EventRecord>), CommandError>
    where
        F: FnOnce(&mut ProtocolState) -> ProtocolResult<T>,
    {
        let output = operation(&mut self.state)?;
        let events = self.state.drain_events();
        let records = self.event_store.append(events)?;
        self.save().await?;
        Ok((output, records))
    }

    /// Write the state file via a temporary sibling
    pub async fn save(&self) -> Result<(), CommandError> {
        let json = serde_json::to_string_pretty(&self.state)?;
        let tmp = self.state_path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.state_path).await?;
        Ok(())
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }
}
