//! SARIMAX order specification.

use std::fmt;

/// SARIMAX(p, d, q)(P, D, Q)\[s\] hyperparameters.
///
/// A value type: two specs are equal iff all seven integers match. The
/// derived ordering is lexicographic over `(p, d, q, P, D, Q, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelSpec {
    /// Non-seasonal AR order.
    pub p: usize,
    /// Non-seasonal differencing order.
    pub d: usize,
    /// Non-seasonal MA order.
    pub q: usize,
    /// Seasonal AR order.
    pub cap_p: usize,
    /// Seasonal differencing order.
    pub cap_d: usize,
    /// Seasonal MA order.
    pub cap_q: usize,
    /// Seasonal period.
    pub s: usize,
}

impl ModelSpec {
    /// Create a spec from `order = (p, d, q)` and `seasonal_order = (P, D, Q, s)`.
    pub fn new(order: (usize, usize, usize), seasonal_order: (usize, usize, usize, usize)) -> Self {
        Self {
            p: order.0,
            d: order.1,
            q: order.2,
            cap_p: seasonal_order.0,
            cap_d: seasonal_order.1,
            cap_q: seasonal_order.2,
            s: seasonal_order.3,
        }
    }

    /// Non-seasonal ARIMA(p, d, q) with a unit period.
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self::new((p, d, q), (0, 0, 0, 1))
    }

    /// `[p, d, q]`
    pub fn order(&self) -> [usize; 3] {
        [self.p, self.d, self.q]
    }

    /// `[P, D, Q, s]`
    pub fn seasonal_order(&self) -> [usize; 4] {
        [self.cap_p, self.cap_d, self.cap_q, self.s]
    }

    /// Build from the array form used in serialized documents.
    pub fn from_arrays(order: [usize; 3], seasonal_order: [usize; 4]) -> Self {
        Self::new(
            (order[0], order[1], order[2]),
            (
                seasonal_order[0],
                seasonal_order[1],
                seasonal_order[2],
                seasonal_order[3],
            ),
        )
    }

    /// Complexity penalty base: `p + d + q + P + D + Q`.
    pub fn complexity(&self) -> usize {
        self.p + self.d + self.q + self.cap_p + self.cap_d + self.cap_q
    }

    /// Check if this is a seasonal model.
    pub fn is_seasonal(&self) -> bool {
        self.s > 1 && (self.cap_p > 0 || self.cap_d > 0 || self.cap_q > 0)
    }

    /// Number of estimated coefficients (AR + MA + seasonal AR + seasonal MA + intercept).
    pub fn num_params(&self) -> usize {
        self.p + self.q + self.cap_p + self.cap_q + 1
    }

    /// Largest autoregressive lag after expanding the seasonal polynomial.
    pub fn max_ar_lag(&self) -> usize {
        self.p + self.cap_p * self.s
    }

    /// Largest moving-average lag after expanding the seasonal polynomial.
    pub fn max_ma_lag(&self) -> usize {
        self.q + self.cap_q * self.s
    }

    /// Observations consumed by differencing.
    pub fn differencing_loss(&self) -> usize {
        self.d + self.cap_d * self.s
    }

    /// Minimum series length a fit needs.
    pub fn min_observations(&self) -> usize {
        self.differencing_loss()
            + self.max_ar_lag().max(self.max_ma_lag())
            + self.num_params().max(2)
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "order=({}, {}, {}), seasonal_order=({}, {}, {}, {})",
            self.p, self.d, self.q, self.cap_p, self.cap_d, self.cap_q, self.s
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_arrays() {
        let spec = ModelSpec::new((2, 1, 1), (1, 1, 1, 12));
        assert_eq!(spec.order(), [2, 1, 1]);
        assert_eq!(spec.seasonal_order(), [1, 1, 1, 12]);
        assert_eq!(ModelSpec::from_arrays([2, 1, 1], [1, 1, 1, 12]), spec);
    }

    #[test]
    fn spec_equality_uses_all_fields() {
        let a = ModelSpec::new((1, 0, 1), (1, 0, 0, 12));
        let b = ModelSpec::new((1, 0, 1), (1, 0, 0, 11));
        assert_ne!(a, b);
        assert_eq!(a, ModelSpec::new((1, 0, 1), (1, 0, 0, 12)));
    }

    #[test]
    fn spec_complexity_excludes_period() {
        let spec = ModelSpec::new((2, 1, 1), (1, 1, 1, 12));
        assert_eq!(spec.complexity(), 7);
        assert_eq!(spec.num_params(), 6);
    }

    #[test]
    fn spec_lags() {
        let spec = ModelSpec::new((1, 1, 2), (1, 1, 1, 12));
        assert_eq!(spec.max_ar_lag(), 13);
        assert_eq!(spec.max_ma_lag(), 14);
        assert_eq!(spec.differencing_loss(), 13);
        assert_eq!(spec.min_observations(), 13 + 14 + 6);
    }

    #[test]
    fn spec_seasonality() {
        assert!(!ModelSpec::arima(1, 1, 1).is_seasonal());
        assert!(!ModelSpec::new((1, 0, 0), (0, 0, 0, 12)).is_seasonal());
        assert!(ModelSpec::new((1, 0, 0), (0, 1, 0, 12)).is_seasonal());
    }

    #[test]
    fn spec_ordering_is_lexicographic() {
        let a = ModelSpec::new((0, 1, 1), (0, 0, 0, 12));
        let b = ModelSpec::new((1, 0, 0), (0, 0, 0, 8));
        assert!(a < b);
    }

    #[test]
    fn spec_display() {
        let spec = ModelSpec::new((4, 0, 0), (1, 0, 0, 8));
        assert_eq!(
            spec.to_string(),
            "order=(4, 0, 0), seasonal_order=(1, 0, 0, 8)"
        );
    }
}
