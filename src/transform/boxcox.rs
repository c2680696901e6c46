//! Box-Cox power transformation.
//!
//! Scalar forward and inverse functions used by
//! [`Transformation::box_cox`](super::Transformation::box_cox), plus
//! maximum-likelihood lambda selection for
//! [`Transformation::box_cox_auto`](super::Transformation::box_cox_auto).

const LAMBDA_ZERO: f64 = 1e-10;

/// Box-Cox transform of a single value.
///
/// For lambda != 0: y = (x^lambda - 1) / lambda
/// For lambda == 0: y = ln(x)
///
/// Non-positive inputs map to NaN.
pub fn boxcox(x: f64, lambda: f64) -> f64 {
    if x <= 0.0 {
        f64::NAN
    } else if lambda.abs() < LAMBDA_ZERO {
        x.ln()
    } else {
        (x.powf(lambda) - 1.0) / lambda
    }
}

/// Inverse Box-Cox transform of a single value.
///
/// For lambda != 0: x = (lambda * y + 1)^(1/lambda)
/// For lambda == 0: x = exp(y)
pub fn inv_boxcox(y: f64, lambda: f64) -> f64 {
    if lambda.abs() < LAMBDA_ZERO {
        y.exp()
    } else {
        let val = lambda * y + 1.0;
        if val <= 0.0 {
            f64::NAN
        } else {
            val.powf(1.0 / lambda)
        }
    }
}

/// Find optimal Box-Cox lambda using maximum likelihood estimation.
///
/// Grid search over [-2, 2] followed by a finer pass around the best value.
/// Non-positive observations are ignored; returns 1.0 when none remain.
pub fn boxcox_lambda(series: &[f64]) -> f64 {
    let positive: Vec<f64> = series.iter().copied().filter(|&x| x > 0.0).collect();
    if positive.is_empty() {
        return 1.0;
    }

    let coarse = best_of(&positive, (-200..=200).map(|i| i as f64 / 100.0), (1.0, f64::NEG_INFINITY));

    let start = (coarse.0 - 0.1).max(-2.0);
    let end = (coarse.0 + 0.1).min(2.0);
    let fine = best_of(
        &positive,
        (0..=100).map(|i| start + (end - start) * i as f64 / 100.0),
        coarse,
    );

    fine.0
}

/// Best (lambda, log-likelihood) among `candidates`, starting from `init`.
fn best_of(series: &[f64], candidates: impl Iterator<Item = f64>, init: (f64, f64)) -> (f64, f64) {
    candidates.fold(init, |best, lambda| {
        let llf = boxcox_llf(series, lambda);
        if llf > best.1 {
            (lambda, llf)
        } else {
            best
        }
    })
}

/// Profile log-likelihood of the transformed data under normality.
fn boxcox_llf(series: &[f64], lambda: f64) -> f64 {
    let n = series.len();
    if n < 2 {
        return f64::NEG_INFINITY;
    }

    let transformed: Vec<f64> = series.iter().map(|&x| boxcox(x, lambda)).collect();
    if transformed.iter().any(|x| x.is_nan()) {
        return f64::NEG_INFINITY;
    }

    let mean = transformed.iter().sum::<f64>() / n as f64;
    let variance = transformed.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    if variance <= 0.0 {
        return f64::NEG_INFINITY;
    }

    let log_sum: f64 = series.iter().map(|x| x.ln()).sum();
    -0.5 * n as f64 * variance.ln() + (lambda - 1.0) * log_sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn boxcox_known_lambdas() {
        assert_relative_eq!(boxcox(3.0, 1.0), 2.0, epsilon = 1e-10);
        assert_relative_eq!(boxcox(3.0, 0.0), 3.0_f64.ln(), epsilon = 1e-10);
        assert_relative_eq!(boxcox(3.0, 2.0), 4.0, epsilon = 1e-10);
    }

    #[test]
    fn boxcox_non_positive_is_nan() {
        assert!(boxcox(0.0, 0.5).is_nan());
        assert!(boxcox(-1.0, 1.0).is_nan());
    }

    #[test]
    fn inv_boxcox_roundtrip() {
        for &lambda in &[0.0, 0.5, 1.0, -0.5] {
            for &x in &[0.5, 1.0, 2.0, 10.0] {
                assert_relative_eq!(inv_boxcox(boxcox(x, lambda), lambda), x, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn inv_boxcox_outside_support_is_nan() {
        assert!(inv_boxcox(-3.0, 0.5).is_nan());
    }

    #[test]
    fn boxcox_lambda_exponential_data() {
        let series: Vec<f64> = (1..=10).map(|i| (i as f64).exp()).collect();
        let lambda = boxcox_lambda(&series);
        assert!(
            lambda.abs() < 0.5,
            "Expected lambda near 0 for exponential data, got {}",
            lambda
        );
    }

    #[test]
    fn boxcox_lambda_without_positive_values_defaults() {
        assert_eq!(boxcox_lambda(&[-1.0, 0.0]), 1.0);
    }
}
