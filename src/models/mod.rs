//! Forecasting models.

mod traits;

pub mod sarimax;

pub use sarimax::{AutoSarimax, AutoSarimaxConfig, ModelSpec, Sarimax};
pub use traits::{BoxedForecaster, Forecaster, Interrupt, NeverInterrupt};
