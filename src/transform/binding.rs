//! Binding recorded transformations to the rows of a covariate table.

use super::transformation::{BoundTransform, Transformation};
use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};

/// A transformation bound either once for every row or once per row.
#[derive(Debug, Clone)]
pub enum TransformBinding {
    /// One pair applied uniformly to every row.
    Shared(BoundTransform),
    /// One pair per row, positionally aligned with the table.
    PerRow(Vec<BoundTransform>),
}

impl TransformBinding {
    pub fn is_identity(&self) -> bool {
        match self {
            TransformBinding::Shared(t) => t.is_identity(),
            TransformBinding::PerRow(ts) => ts.iter().all(BoundTransform::is_identity),
        }
    }

    pub fn is_row_varying(&self) -> bool {
        matches!(self, TransformBinding::PerRow(_))
    }

    /// The pair that applies to `row`.
    pub fn for_row(&self, row: usize) -> Result<&BoundTransform> {
        match self {
            TransformBinding::Shared(t) => Ok(t),
            TransformBinding::PerRow(ts) => {
                ts.get(row).ok_or(ForecastError::IndexOutOfBounds {
                    index: row,
                    size: ts.len(),
                })
            }
        }
    }
}

/// Bind one transformation against `table`.
///
/// Transformations without required covariates produce a single shared
/// pair. Otherwise each row gets its own pair, evaluated in that row's
/// values layered over the transformation's defining context. A required
/// covariate found in neither place is a [`ForecastError::MissingVariable`].
pub fn bind_transformation(
    transformation: &Transformation,
    table: &TimeSeries,
) -> Result<TransformBinding> {
    if !transformation.is_row_varying() {
        return Ok(TransformBinding::Shared(transformation.bind(None)));
    }

    if let Some(missing) = transformation
        .required_covariates()
        .iter()
        .find(|name| !table.has_column(name) && !transformation.context().contains_key(*name))
    {
        return Err(ForecastError::MissingVariable(missing.clone()));
    }

    let bound = (0..table.len())
        .map(|row| {
            let ctx = table.row_context(row)?;
            Ok(transformation.bind(Some(&ctx)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TransformBinding::PerRow(bound))
}

/// Bind every response's transformation against `table`, in response order.
pub fn bind_transformations(
    transformations: &[Transformation],
    table: &TimeSeries,
) -> Result<Vec<TransformBinding>> {
    transformations
        .iter()
        .map(|t| bind_transformation(t, table))
        .collect()
}
