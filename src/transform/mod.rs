//! Response transformations and their binding to future data.
//!
//! # Example
//!
//! ```
//! use anofox_distcast::transform::Transformation;
//!
//! let t = Transformation::box_cox(0.5);
//! let bound = t.bind(None);
//! assert!((bound.inverse(bound.forward(9.0)) - 9.0).abs() < 1e-9);
//! ```

pub mod binding;
pub mod boxcox;
mod transformation;

pub use binding::{bind_transformation, bind_transformations, TransformBinding};
pub use boxcox::{boxcox, boxcox_lambda, inv_boxcox};
pub use transformation::{BoundTransform, EvalContext, Transformation};
