//! Position lifecycle status

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    #[default]
    Nonexistent,
    Active,
    ClosedByOwner,
    ClosedByLiquidation,
    ClosedByRedemption,
}

/// Terminal statuses a position can be closed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    ByOwner,
    ByLiquidation,
    ByRedemption,
}

impl PositionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, PositionStatus::Active)
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            PositionStatus::ClosedByOwner
                | PositionStatus::ClosedByLiquidation
                | PositionStatus::ClosedByRedemption
        )
    }
}

impl From<CloseReason> for PositionStatus {
    fn from(reason: CloseReason) -> Self {
        match reason {
            CloseReason::ByOwner => PositionStatus::ClosedByOwner,
            CloseReason::ByLiquidation => PositionStatus::ClosedByLiquidation,
            CloseReason::ByRedemption => PositionStatus::ClosedByRedemption,
        }
    }
}
