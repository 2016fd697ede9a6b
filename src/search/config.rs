//! Search configuration and the hyperparameter grid.

use crate::error::SearchError;
use crate::models::{AutoSarimaxConfig, ModelSpec};
use std::ops::Range;

/// Seasonal period used by the fallback automatic search.
pub const DEFAULT_FALLBACK_PERIOD: usize = 12;

/// Half-open ranges for the seven SARIMAX integers.
///
/// Enumeration order is a nested loop with `p` outermost and `s` innermost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterGrid {
    pub p: Range<usize>,
    pub d: Range<usize>,
    pub q: Range<usize>,
    pub cap_p: Range<usize>,
    pub cap_d: Range<usize>,
    pub cap_q: Range<usize>,
    pub s: Range<usize>,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self {
            p: 0..5,
            d: 0..4,
            q: 0..4,
            cap_p: 0..5,
            cap_d: 0..4,
            cap_q: 0..4,
            s: 8..16,
        }
    }
}

impl ParameterGrid {
    /// Set the non-seasonal ranges.
    pub fn with_order(mut self, p: Range<usize>, d: Range<usize>, q: Range<usize>) -> Self {
        self.p = p;
        self.d = d;
        self.q = q;
        self
    }

    /// Set the seasonal ranges.
    pub fn with_seasonal_order(
        mut self,
        cap_p: Range<usize>,
        cap_d: Range<usize>,
        cap_q: Range<usize>,
    ) -> Self {
        self.cap_p = cap_p;
        self.cap_d = cap_d;
        self.cap_q = cap_q;
        self
    }

    /// Set the seasonal period range.
    pub fn with_periods(mut self, s: Range<usize>) -> Self {
        self.s = s;
        self
    }

    fn ranges(&self) -> [(&'static str, &Range<usize>); 7] {
        [
            ("p", &self.p),
            ("d", &self.d),
            ("q", &self.q),
            ("P", &self.cap_p),
            ("D", &self.cap_d),
            ("Q", &self.cap_q),
            ("s", &self.s),
        ]
    }

    /// Reject empty ranges, a zero seasonal period, and grids too large to
    /// count.
    pub fn validate(&self) -> Result<(), SearchError> {
        for (name, range) in self.ranges() {
            if range.is_empty() {
                return Err(SearchError::InvalidConfig(format!(
                    "range for {name} is empty ({}..{})",
                    range.start, range.end
                )));
            }
        }
        if self.s.start == 0 {
            return Err(SearchError::InvalidConfig(
                "seasonal period must be at least 1".to_string(),
            ));
        }
        self.checked_total()
            .map(|_| ())
            .ok_or_else(|| SearchError::InvalidConfig("grid is too large".to_string()))
    }

    fn checked_total(&self) -> Option<usize> {
        self.ranges()
            .iter()
            .try_fold(1usize, |acc, (_, range)| acc.checked_mul(range.len()))
    }

    /// Number of combinations in the Cartesian product.
    pub fn total_combinations(&self) -> usize {
        self.checked_total().unwrap_or(usize::MAX)
    }

    /// The combination at position `index` of the enumeration order.
    pub fn spec_at(&self, index: usize) -> Option<ModelSpec> {
        if index >= self.total_combinations() {
            return None;
        }
        let mut digits = [0usize; 7];
        let mut rest = index;
        for (slot, (_, range)) in digits.iter_mut().zip(self.ranges()).rev() {
            let len = range.len();
            *slot = range.start + rest % len;
            rest /= len;
        }
        let [p, d, q, cap_p, cap_d, cap_q, s] = digits;
        Some(ModelSpec::new((p, d, q), (cap_p, cap_d, cap_q, s)))
    }

    /// Iterate over every combination in enumeration order.
    pub fn iter(&self) -> GridIter<'_> {
        GridIter {
            grid: self,
            index: 0,
            total: self.total_combinations(),
        }
    }
}

/// Iterator over a [`ParameterGrid`].
#[derive(Debug, Clone)]
pub struct GridIter<'a> {
    grid: &'a ParameterGrid,
    index: usize,
    total: usize,
}

impl Iterator for GridIter<'_> {
    type Item = ModelSpec;

    fn next(&mut self) -> Option<ModelSpec> {
        if self.index >= self.total {
            return None;
        }
        let spec = self.grid.spec_at(self.index);
        self.index += 1;
        spec
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for GridIter<'_> {}

/// Configuration for a parameter search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub grid: ParameterGrid,
    /// Seasonal period of the fallback automatic search.
    pub fallback_period: usize,
    /// Number of ranked models kept and handed to the preset bridge.
    pub top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            grid: ParameterGrid::default(),
            fallback_period: DEFAULT_FALLBACK_PERIOD,
            top_k: crate::search::topk::DEFAULT_TOP_K,
        }
    }
}

impl SearchConfig {
    pub fn with_grid(mut self, grid: ParameterGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_fallback_period(mut self, period: usize) -> Self {
        self.fallback_period = period;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        self.grid.validate()?;
        if self.top_k == 0 {
            return Err(SearchError::InvalidConfig(
                "top_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Stepwise automatic search used when no grid combination can be refit.
    pub fn fallback_config(&self) -> AutoSarimaxConfig {
        AutoSarimaxConfig::default().with_seasonal_period(self.fallback_period)
    }
}
