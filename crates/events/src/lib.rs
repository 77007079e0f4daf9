//! CDP Events - JSONL event journal
//!
//! Events drained from a committed operation are appended as one batch that
//! shares a correlation id. Files rotate daily; sequence numbers continue
//! across files.

pub mod error;
pub mod reader;
pub mod record;
pub mod store;

pub use error::EventError;
pub use reader::EventReader;
pub use record::EventRecord;
pub use store::EventStore;
