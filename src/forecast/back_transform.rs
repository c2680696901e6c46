//! Mapping raw forecast distributions back onto the response scale.

use crate::distribution::{Dist, Distribution};
use crate::error::{ForecastError, Result};
use crate::transform::{BoundTransform, Transformation, TransformBinding};

/// Reject transformation sets the back-transformer cannot invert.
///
/// At most one response may carry a non-identity transformation.
pub fn check_transformations(transformations: &[Transformation]) -> Result<()> {
    let count = transformations.iter().filter(|t| !t.is_identity()).count();
    if count > 1 {
        return Err(ForecastError::UnsupportedTransform { count });
    }
    Ok(())
}

/// Invert the bound transformations on `raw`, one binding per response.
///
/// Sample rows have each draw mapped through the row's inverse. Analytical
/// rows become transformed views whose summaries are derived through the
/// row's inverse on demand; with a row-varying transformation every row
/// carries its own inverse rather than one shared across rows. For
/// multivariate rows only the margin of the transformed response changes. The result is labelled with `response`.
pub fn back_transform(
    raw: Distribution,
    bindings: &[TransformBinding],
    response: &[String],
) -> Result<Distribution> {
    if bindings.len() != response.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: response.len(),
            got: bindings.len(),
        });
    }

    let transformed: Vec<usize> = bindings
        .iter()
        .enumerate()
        .filter(|(_, b)| !b.is_identity())
        .map(|(d, _)| d)
        .collect();
    let dist = match transformed.as_slice() {
        [] => raw,
        [dim] => {
            let binding = &bindings[*dim];
            let multivariate = response.len() > 1;
            raw.map(|row, element| {
                let transform = binding.for_row(row)?;
                if multivariate {
                    invert_margin(element, *dim, transform)
                } else {
                    invert(element, transform)
                }
            })?
        }
        many => {
            return Err(ForecastError::UnsupportedTransform { count: many.len() });
        }
    };
    Ok(dist.with_dimnames(response.to_vec()))
}

fn invert(element: &Dist, transform: &BoundTransform) -> Result<Dist> {
    match element {
        Dist::Sample(draws) => Ok(Dist::Sample(
            draws.iter().map(|y| transform.inverse(*y)).collect(),
        )),
        Dist::Joint(_) => Err(ForecastError::InvalidParameter(
            "a multivariate forecast needs one response name per margin".to_string(),
        )),
        analytical => Ok(analytical.clone().transformed(transform.clone())),
    }
}

fn invert_margin(element: &Dist, dim: usize, transform: &BoundTransform) -> Result<Dist> {
    let Dist::Joint(margins) = element else {
        return Err(ForecastError::DimensionMismatch {
            expected: dim + 1,
            got: element.dimensions(),
        });
    };
    if dim >= margins.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: dim + 1,
            got: margins.len(),
        });
    }

    margins
        .iter()
        .enumerate()
        .map(|(d, margin)| {
            if d == dim {
                invert(margin, transform)
            } else {
                Ok(margin.clone())
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(Dist::Joint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TimeSeries;
    use crate::transform::bind_transformation;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn table(population: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let idx = (0..population.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        TimeSeries::index_only(idx)
            .unwrap()
            .with_column("population", population)
            .unwrap()
    }

    fn shared(t: &Transformation) -> TransformBinding {
        bind_transformation(t, &table(vec![1.0])).unwrap()
    }

    #[test]
    fn identity_only_relabels() {
        let raw = Distribution::normal(&[1.0], &[1.0]).unwrap();
        let out = back_transform(
            raw.clone(),
            &[shared(&Transformation::identity())],
            &["y".to_string()],
        )
        .unwrap();
        assert_eq!(out.elements(), raw.elements());
        assert_eq!(out.dimnames(), &["y".to_string()]);
    }

    #[test]
    fn samples_are_mapped_through_the_inverse() {
        let raw = Distribution::from_samples(vec![vec![0.0, 1.0, 2.0]]);
        let out =
            back_transform(raw, &[shared(&Transformation::log())], &["y".to_string()]).unwrap();
        match out.get(0).unwrap() {
            Dist::Sample(draws) => {
                assert_relative_eq!(draws[1], std::f64::consts::E, epsilon = 1e-12);
                assert_relative_eq!(draws[2], 2f64.exp(), epsilon = 1e-12);
            }
            other => panic!("expected samples, got {other:?}"),
        }
    }

    #[test]
    fn analytical_rows_become_transformed_views() {
        let raw = Distribution::normal(&[0.0], &[0.5]).unwrap();
        let out =
            back_transform(raw, &[shared(&Transformation::log())], &["y".to_string()]).unwrap();
        assert!(matches!(out.get(0).unwrap(), Dist::Transformed(..)));
        // Median of a log-normal is exp(mu)
        assert_relative_eq!(out.median()[0], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn row_varying_inverse_uses_each_rows_covariates() {
        let per_capita = Transformation::per_capita("population");
        let binding = bind_transformation(&per_capita, &table(vec![10.0, 100.0])).unwrap();
        let raw = Distribution::from_samples(vec![vec![2.0], vec![2.0]]);

        let out = back_transform(raw, &[binding], &["y".to_string()]).unwrap();
        assert_eq!(out.get(0), Some(&Dist::Sample(vec![20.0])));
        assert_eq!(out.get(1), Some(&Dist::Sample(vec![200.0])));
    }

    #[test]
    fn two_transformed_responses_are_unsupported() {
        let transformations = [Transformation::log(), Transformation::sqrt()];
        assert_eq!(
            check_transformations(&transformations),
            Err(ForecastError::UnsupportedTransform { count: 2 })
        );

        let bindings: Vec<_> = transformations.iter().map(shared).collect();
        let raw = Distribution::new(vec![Dist::Joint(vec![
            Dist::normal(0.0, 1.0),
            Dist::normal(0.0, 1.0),
        ])]);
        let err = back_transform(raw, &bindings, &["a".into(), "b".into()]).unwrap_err();
        assert_eq!(err, ForecastError::UnsupportedTransform { count: 2 });
    }

    #[test]
    fn only_the_transformed_margin_changes() {
        let bindings = [
            shared(&Transformation::identity()),
            shared(&Transformation::log()),
        ];
        let raw = Distribution::new(vec![Dist::Joint(vec![
            Dist::normal(5.0, 1.0),
            Dist::normal(0.0, 0.1),
        ])]);

        let out = back_transform(raw, &bindings, &["a".into(), "b".into()]).unwrap();
        let margins = out.marginal(0).unwrap();
        assert_relative_eq!(margins.mean()[0], 5.0, epsilon = 1e-12);
        assert_relative_eq!(out.marginal(1).unwrap().median()[0], 1.0, epsilon = 1e-9);
    }
}
