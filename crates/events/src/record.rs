//! One journal line

use cdp_core::ProtocolEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the journal, starting at 1
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    /// Shared by every event of one committed operation
    pub correlation_id: Uuid,
    pub event: ProtocolEvent,
}

impl EventRecord {
    pub fn kind(&self) -> &'static str {
        self.event.kind()
    }
}
