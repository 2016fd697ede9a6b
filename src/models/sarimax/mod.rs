//! Seasonal ARIMA models.
//!
//! This module provides:
//! - [`ModelSpec`], the seven-integer SARIMAX order
//! - [`Sarimax`], fitted by conditional sum of squares
//! - [`AutoSarimax`] for automatic order selection

mod auto;
mod diff;
mod model;
mod spec;

pub use auto::{AutoSarimax, AutoSarimaxConfig};
pub use diff::{
    apply_polynomial, difference, differencing_polynomial, integrate_polynomial,
    seasonal_difference,
};
pub use model::Sarimax;
pub use spec::ModelSpec;
