//! Ordering of active positions by nominal collateral ratio

use std::collections::{BTreeMap, BTreeSet};

use cdp_core::PositionId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Active positions sorted ascending by ratio, ties broken by id
///
/// Keeps a reverse index from id to the ratio it was inserted under so that
/// removal and re-keying are O(log n). Serializes as the reverse index only;
/// the sorted set is rebuilt on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<PositionId, Decimal>", into = "BTreeMap<PositionId, Decimal>")]
pub struct SortedPositions {
    by_ratio: BTreeSet<(Decimal, PositionId)>,
    ratios: BTreeMap<PositionId, Decimal>,
}

impl SortedPositions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or re-key a position
    pub fn insert(&mut self, id: PositionId, ratio: Decimal) {
        if let Some(old) = self.ratios.insert(id.clone(), ratio) {
            self.by_ratio.remove(&(old, id.clone()));
        }
        self.by_ratio.insert((ratio, id));
    }

    /// Returns false if the id was not present
    pub fn remove(&mut self, id: &PositionId) -> bool {
        match self.ratios.remove(id) {
            Some(ratio) => {
                self.by_ratio.remove(&(ratio, id.clone()));
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &PositionId) -> bool {
        self.ratios.contains_key(id)
    }

    pub fn ratio_of(&self, id: &PositionId) -> Option<Decimal> {
        self.ratios.get(id).copied()
    }

    /// Lowest-ratio position
    pub fn first(&self) -> Option<&PositionId> {
        self.by_ratio.iter().next().map(|(_, id)| id)
    }

    /// Highest-ratio position
    pub fn last(&self) -> Option<&PositionId> {
        self.by_ratio.iter().next_back().map(|(_, id)| id)
    }

    /// Ascending by ratio
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PositionId> {
        self.by_ratio.iter().map(|(_, id)| id)
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }
}

impl From<BTreeMap<PositionId, Decimal>> for SortedPositions {
    fn from(ratios: BTreeMap<PositionId, Decimal>) -> Self {
        let by_ratio = ratios.iter().map(|(id, ratio)| (*ratio, id.clone())).collect();
        Self { by_ratio, ratios }
    }
}

impl From<SortedPositions> for BTreeMap<PositionId, Decimal> {
    fn from(sorted: SortedPositions) -> Self {
        sorted.ratios
    }
}
