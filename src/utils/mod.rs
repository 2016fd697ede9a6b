//! Utility functions for model fitting and evaluation.

pub mod metrics;
pub mod optimization;
pub mod stats;

pub use metrics::{calculate_metrics, AccuracyMetrics, PrecisionBreakdown};
pub use optimization::{nelder_mead, nelder_mead_until, NelderMeadConfig, NelderMeadResult};
pub use stats::quantile_normal;
