//! CDP Price Oracle
//!
//! Supplies the collateral price the engine entry points take as an argument.
//! `MockOracle` holds a settable price in memory; `FileOracle` persists the
//! last published price as JSON so separate CLI invocations share it.

mod error;
mod file;
mod mock;
mod types;

pub use error::OracleError;
pub use file::FileOracle;
pub use mock::MockOracle;
pub use types::{AssetPair, Price, PriceOracle};
