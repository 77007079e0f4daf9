//! Caller identity and component roles
//!
//! The surrounding execution context authenticates every call and hands the
//! engine a `Caller`. Privileged entry points compare it against the role
//! they accept; they never trust an identity they did not receive explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

use crate::error::ProtocolError;
use crate::id::Owner;

/// Protocol components allowed to call each other's privileged entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    LifecycleManager,
    PositionOperations,
    ActivePool,
    DefaultPool,
}

/// An authenticated caller: either a protocol component or an external account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Caller {
    Component(Role),
    Account(Owner),
}

impl Caller {
    /// Fail with `NotAuthorized` unless the caller is one of `allowed`
    pub fn require(&self, allowed: &[Role]) -> Result<(), ProtocolError> {
        match self {
            Caller::Component(role) if allowed.contains(role) => Ok(()),
            _ => Err(ProtocolError::NotAuthorized {
                caller: self.to_string(),
                required: allowed
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join("|"),
            }),
        }
    }
}

impl From<Role> for Caller {
    fn from(role: Role) -> Self {
        Caller::Component(role)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Component(role) => write!(f, "{}", role),
            Caller::Account(owner) => write!(f, "ACCOUNT:{}", owner),
        }
    }
}
