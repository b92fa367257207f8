//! Weighted possibility set for a single cell.
//!
//! Maps candidate tile ids to positive weights and draws one id at random,
//! proportional to weight. Entries are kept in ascending id order, which is
//! also the order a freshly initialized cell inserts them in.
//!
//! The total weight is cached. Any `add` or `remove` marks the cache stale
//! (a non-positive sentinel), and the next draw recomputes it, so a burst of
//! removals during narrowing costs one summation rather than one per removal.

use std::collections::BTreeMap;

use crate::catalog::TileId;
use crate::error::CollapseError;
use crate::rng::TileRng;

/// Weight stored when a caller supplies a non-positive one.
pub const FALLBACK_WEIGHT: f64 = 1.0;

/// Candidate ids with weights, plus a lazily cached total.
#[derive(Debug, Clone, Default)]
pub struct WeightedPossibilitySet {
    entries: BTreeMap<TileId, f64>,
    /// Exact sum of `entries` when > 0, stale otherwise
    total: f64,
}

impl WeightedPossibilitySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `id`. Non-positive weights are stored as `1.0`.
    pub fn add(&mut self, id: TileId, weight: f64) {
        let weight = if weight > 0.0 { weight } else { FALLBACK_WEIGHT };
        self.entries.insert(id, weight);
        self.total = 0.0;
    }

    /// Remove `id`, returning its weight if it was present.
    pub fn remove(&mut self, id: TileId) -> Option<f64> {
        let removed = self.entries.remove(&id);
        if removed.is_some() {
            self.total = 0.0;
        }
        removed
    }

    /// Keep only the ids for which `keep` returns true.
    ///
    /// Returns the number of removed ids.
    pub fn retain(&mut self, mut keep: impl FnMut(TileId) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|&id, _| keep(id));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.total = 0.0;
        }
        removed
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total = 0.0;
    }

    /// Whether `id` is still possible.
    pub fn contains(&self, id: TileId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Weight stored for `id`.
    pub fn weight(&self, id: TileId) -> Option<f64> {
        self.entries.get(&id).copied()
    }

    /// Number of remaining ids.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remaining ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.entries.keys().copied()
    }

    /// `(id, weight)` pairs in ascending id order.
    pub fn entries(&self) -> impl Iterator<Item = (TileId, f64)> + '_ {
        self.entries.iter().map(|(&id, &w)| (id, w))
    }

    /// Cached total, or `None` when stale.
    pub fn cached_total(&self) -> Option<f64> {
        (self.total > 0.0).then_some(self.total)
    }

    /// Exact total weight, refreshing the cache if it is stale.
    pub fn total_weight(&mut self) -> f64 {
        if self.total <= 0.0 {
            self.total = self.entries.values().sum();
        }
        self.total
    }

    /// Draw one id at random, proportional to weight.
    ///
    /// Picks `r` uniformly in `[0, total)` and walks entries in id order,
    /// subtracting each weight until `r` falls inside the current entry.
    /// Fails with `EmptyDraw` when the set is empty.
    pub fn draw(&mut self, rng: &mut dyn TileRng) -> Result<TileId, CollapseError> {
        if self.entries.is_empty() {
            return Err(CollapseError::EmptyDraw);
        }

        let total = self.total_weight();
        let mut remaining = rng.next_double() * total;
        let mut last = None;

        for (&id, &weight) in &self.entries {
            if remaining < weight {
                return Ok(id);
            }
            remaining -= weight;
            last = Some(id);
        }

        // Accumulated float error can walk past the final entry.
        last.ok_or(CollapseError::EmptyDraw)
    }
}

impl PartialEq for WeightedPossibilitySet {
    /// Sets are equal when their id -> weight pairs are; cache state is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
