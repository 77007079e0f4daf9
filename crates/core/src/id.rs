//! Identities: owners and their positions
//!
//! Format of a position id: `OWNER#INDEX` (e.g. `ALICE#0`).
//! An owner may hold many positions; each gets the next unused index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Owner id cannot be empty")]
    EmptyOwner,

    #[error("Owner id cannot contain '#': {0}")]
    ReservedCharacter(String),

    #[error("Invalid position id format: {0}")]
    InvalidPositionId(String),
}

/// Account collecting borrowing fees. The '#' keeps it out of reach of
/// `Owner::new`.
pub const TREASURY: &str = "#TREASURY";

/// Authenticated identity of an external account (borrower, depositor, redeemer)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Owner(String);

impl Owner {
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into().trim().to_uppercase();
        if id.is_empty() {
            return Err(IdError::EmptyOwner);
        }
        if id.contains('#') {
            return Err(IdError::ReservedCharacter(id));
        }
        Ok(Self(id))
    }

    pub fn treasury() -> Self {
        Self(TREASURY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Owner {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Owner {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == TREASURY {
            return Ok(Self::treasury());
        }
        Self::new(value)
    }
}

impl From<Owner> for String {
    fn from(owner: Owner) -> Self {
        owner.0
    }
}

/// Stable identifier of one position: the owner plus a per-owner index
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PositionId {
    pub owner: Owner,
    pub index: u32,
}

impl PositionId {
    pub fn new(owner: Owner, index: u32) -> Self {
        Self { owner, index }
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner, self.index)
    }
}

impl FromStr for PositionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, index) = s
            .rsplit_once('#')
            .ok_or_else(|| IdError::InvalidPositionId(s.to_string()))?;
        let index = index
            .parse::<u32>()
            .map_err(|_| IdError::InvalidPositionId(s.to_string()))?;
        Ok(Self::new(Owner::new(owner)?, index))
    }
}

impl TryFrom<String> for PositionId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PositionId> for String {
    fn from(id: PositionId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_uppercased() {
        let owner = Owner::new("alice").unwrap();
        assert_eq!(owner.as_str(), "ALICE");
    }

    #[test]
    fn test_owner_rejects_empty_and_hash() {
        assert_eq!(Owner::new("  "), Err(IdError::EmptyOwner));
        assert!(matches!(Owner::new("a#b"), Err(IdError::ReservedCharacter(_))));
    }

    #[test]
    fn test_treasury_unreachable_from_user_input() {
        assert_ne!(Owner::new("treasury").unwrap(), Owner::treasury());
        assert!(TREASURY.parse::<Owner>().is_err());

        let mut wallets = std::collections::BTreeMap::new();
        wallets.insert(Owner::treasury(), 1u8);
        let json = serde_json::to_string(&wallets).unwrap();
        let parsed: std::collections::BTreeMap<Owner, u8> = serde_json::from_str(&json).unwrap();
        assert!(parsed.contains_key(&Owner::treasury()));
    }

    #[test]
    fn test_position_id_display_and_parse() {
        let id = PositionId::new(Owner::new("bob").unwrap(), 3);
        assert_eq!(id.to_string(), "BOB#3");
        assert_eq!("bob#3".parse::<PositionId>().unwrap(), id);
    }

    #[test]
    fn test_position_id_invalid() {
        assert!("BOB".parse::<PositionId>().is_err());
        assert!("BOB#x".parse::<PositionId>().is_err());
    }

    #[test]
    fn test_position_id_as_map_key_in_json() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(PositionId::new(Owner::new("carol").unwrap(), 0), 1u8);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"CAROL#0":1}"#);
    }
}
