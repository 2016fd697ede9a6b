//! Bounded ranking of the best configurations seen so far.

use crate::models::ModelSpec;
use crate::search::evaluator::Scorecard;
use std::cmp::Ordering;

/// Number of configurations kept by default.
pub const DEFAULT_TOP_K: usize = 3;

/// A configuration together with its scorecard.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedModel {
    pub spec: ModelSpec,
    pub scorecard: Scorecard,
}

impl RankedModel {
    pub fn new(spec: ModelSpec, scorecard: Scorecard) -> Self {
        Self { spec, scorecard }
    }
}

/// Ranking order: higher precision first, then lower composite score, then
/// the lexicographically smaller spec.
pub fn rank_order(a: &RankedModel, b: &RankedModel) -> Ordering {
    b.scorecard
        .precision_final()
        .total_cmp(&a.scorecard.precision_final())
        .then_with(|| {
            a.scorecard
                .composite_score
                .total_cmp(&b.scorecard.composite_score)
        })
        .then_with(|| a.spec.cmp(&b.spec))
}

/// Keeps at most `capacity` entries sorted by [`rank_order`].
///
/// Every offer is appended, the list re-sorted and truncated, so the lowest
/// entry is evicted once the tracker is full. Sentinel scorecards compete
/// like any other and rank last.
#[derive(Debug, Clone)]
pub struct TopKTracker {
    capacity: usize,
    entries: Vec<RankedModel>,
}

impl TopKTracker {
    /// Tracker holding the best three configurations.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TOP_K)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity + 1),
        }
    }

    /// Offer a result. Returns true when it is retained.
    pub fn offer(&mut self, spec: ModelSpec, scorecard: Scorecard) -> bool {
        self.entries.push(RankedModel::new(spec, scorecard));
        self.entries.sort_by(rank_order);
        self.entries.truncate(self.capacity);
        self.entries.iter().any(|entry| entry.spec == spec)
    }

    /// An independent copy of the current ranking.
    pub fn snapshot(&self) -> Vec<RankedModel> {
        self.entries.clone()
    }

    /// Borrow the current ranking.
    pub fn entries(&self) -> &[RankedModel] {
        &self.entries
    }

    pub fn best(&self) -> Option<&RankedModel> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for TopKTracker {
    fn default() -> Self {
        Self::new()
    }
}
