//! Fitted models and the reference estimators used to produce them.
//!
//! An [`Estimator`] turns a (transformed) response and its evaluated
//! specials into a [`ModelFit`]. A [`FittedModel`] wraps the fit together
//! with the fitting data and recorded transformations so that forecasts can
//! be produced on the original response scale.

mod fitted;
mod linear;
mod naive;
mod traits;

pub use fitted::FittedModel;
pub(crate) use fitted::{row_of, row_positions};
pub use linear::{LinearFit, LinearModel};
pub use naive::{Naive, NaiveFit};
pub use traits::{Estimator, GenerateOptions, ModelFit, SimulatedPaths};
