//! TimeSeries data structure for monthly SAIDI observations.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// A univariate time series with strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    label: Option<String>,
}

impl TimeSeries {
    /// Create a univariate time series.
    ///
    /// Timestamps must be strictly increasing and every value finite.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(ForecastError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }

        Ok(Self {
            timestamps,
            values,
            label: None,
        })
    }

    /// Attach a label (usually the source column name).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get the observed values.
    pub fn primary_values(&self) -> &[f64] {
        &self.values
    }

    /// Get the label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// First timestamp.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    /// Last timestamp.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Extract the observations in `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(ForecastError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "slice end {} exceeds series length {}",
                end,
                self.len()
            )));
        }

        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            label: self.label.clone(),
        })
    }

    /// Split off the trailing `tail` observations.
    ///
    /// Returns `(head, tail)`; the head keeps at least one observation.
    pub fn split_tail(&self, tail: usize) -> Result<(TimeSeries, TimeSeries)> {
        if tail >= self.len() {
            return Err(ForecastError::InsufficientData {
                needed: tail + 1,
                got: self.len(),
            });
        }
        let cut = self.len() - tail;
        Ok((self.slice(0, cut)?, self.slice(cut, self.len())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Months, TimeZone};

    fn monthly(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| base.checked_add_months(Months::new(i as u32)).unwrap())
            .collect()
    }

    #[test]
    fn univariate_basic() {
        let ts = TimeSeries::univariate(monthly(3), vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(ts.len(), 3);
        assert!(!ts.is_empty());
        assert_eq!(ts.primary_values(), &[1.0, 2.0, 3.0]);
        assert_eq!(ts.start(), Some(monthly(1)[0]));
    }

    #[test]
    fn rejects_non_increasing_timestamps() {
        let mut stamps = monthly(3);
        stamps.swap(1, 2);
        let err = TimeSeries::univariate(stamps, vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, ForecastError::TimestampError(_)));
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let mut stamps = monthly(3);
        stamps[2] = stamps[1];
        assert!(TimeSeries::univariate(stamps, vec![1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = TimeSeries::univariate(monthly(3), vec![1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ForecastError::DimensionMismatch {
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn rejects_non_finite_values() {
        let err = TimeSeries::univariate(monthly(3), vec![1.0, f64::NAN, 3.0]).unwrap_err();
        assert_eq!(err, ForecastError::MissingValues);
    }

    #[test]
    fn split_tail_keeps_order() {
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let ts = TimeSeries::univariate(monthly(10), values).unwrap();
        let (train, test) = ts.split_tail(4).unwrap();
        assert_eq!(train.len(), 6);
        assert_eq!(test.primary_values(), &[6.0, 7.0, 8.0, 9.0]);
        assert_eq!(test.timestamps()[0], ts.timestamps()[6]);
    }

    #[test]
    fn split_tail_requires_head() {
        let ts = TimeSeries::univariate(monthly(4), vec![1.0; 4]).unwrap();
        assert!(matches!(
            ts.split_tail(4),
            Err(ForecastError::InsufficientData { needed: 5, got: 4 })
        ));
    }

    #[test]
    fn label_is_carried_by_slices() {
        let ts = TimeSeries::univariate(monthly(4), vec![1.0; 4])
            .unwrap()
            .with_label("SAIDI");
        assert_eq!(ts.slice(1, 3).unwrap().label(), Some("SAIDI"));
    }
}
