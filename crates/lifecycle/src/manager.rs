//! Lifecycle Manager component

use cdp_core::{Caller, Role};

/// System-initiated position lifecycle: liquidation and redemption
///
/// Stateless; it acts on the `ProtocolState` it is handed and identifies
/// itself to pools, ledger and reserve as `Role::LifecycleManager`.
#[derive(Debug, Clone)]
pub struct LifecycleManager {
    caller: Caller,
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleManager {
    pub const ROLE: Role = Role::LifecycleManager;

    pub fn new() -> Self {
        Self {
            caller: Caller::from(Self::ROLE),
        }
    }

    pub(crate) fn caller(&self) -> &Caller {
        &self.caller
    }
}
