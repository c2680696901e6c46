//! Single-row distribution values.

use crate::error::{ForecastError, Result};
use crate::transform::BoundTransform;
use crate::utils::stats;
use rand::Rng;
use statrs::distribution::{Continuous, ContinuousCDF, Normal};
use std::f64::consts::PI;

/// Representation family of a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistKind {
    /// A finite set of simulated draws.
    Sample,
    /// A closed-form family, possibly viewed through a transformation.
    Analytical,
}

/// The distribution of a forecast at one future time point.
#[derive(Debug, Clone)]
pub enum Dist {
    /// Gaussian with the given mean and standard deviation.
    Normal { mean: f64, sd: f64 },
    /// All mass at a single value.
    Degenerate(f64),
    /// Empirical distribution of simulated draws.
    Sample(Vec<f64>),
    /// `inner` viewed through the inverse of a bound transformation.
    ///
    /// Values are mapped on demand: draws and quantiles go through the
    /// inverse, probabilities and densities go back through the forward.
    Transformed(Box<Dist>, BoundTransform),
    /// Independent marginals, one per response dimension.
    Joint(Vec<Dist>),
}

impl Dist {
    /// Gaussian element; a zero standard deviation collapses to a point mass.
    pub fn normal(mean: f64, sd: f64) -> Self {
        if sd == 0.0 {
            Dist::Degenerate(mean)
        } else {
            Dist::Normal { mean, sd }
        }
    }

    /// View this element through `transform`'s inverse.
    pub fn transformed(self, transform: BoundTransform) -> Self {
        if transform.is_identity() {
            self
        } else {
            Dist::Transformed(Box::new(self), transform)
        }
    }

    pub fn kind(&self) -> DistKind {
        match self {
            Dist::Sample(_) => DistKind::Sample,
            Dist::Joint(parts) if !parts.is_empty() && parts.iter().all(Dist::is_sample) => {
                DistKind::Sample
            }
            _ => DistKind::Analytical,
        }
    }

    pub fn is_sample(&self) -> bool {
        self.kind() == DistKind::Sample
    }

    /// Number of response dimensions.
    pub fn dimensions(&self) -> usize {
        match self {
            Dist::Joint(parts) => parts.len(),
            _ => 1,
        }
    }

    /// Marginal distribution of one dimension.
    pub fn marginal(&self, dimension: usize) -> Result<&Dist> {
        match self {
            Dist::Joint(parts) => parts.get(dimension).ok_or(ForecastError::IndexOutOfBounds {
                index: dimension,
                size: parts.len(),
            }),
            other if dimension == 0 => Ok(other),
            _ => Err(ForecastError::IndexOutOfBounds {
                index: dimension,
                size: 1,
            }),
        }
    }

    /// Expected value.
    ///
    /// Transformed elements use a second-order Taylor expansion of the
    /// inverse around the inner mean. Joint elements have no scalar mean.
    pub fn mean(&self) -> f64 {
        match self {
            Dist::Normal { mean, .. } => *mean,
            Dist::Degenerate(x) => *x,
            Dist::Sample(draws) => stats::mean(draws),
            Dist::Transformed(inner, t) => {
                let mu = inner.mean();
                let var = inner.variance();
                let g = |x: f64| t.inverse(x);
                if var == 0.0 {
                    return g(mu);
                }
                g(mu) + 0.5 * second_derivative(g, mu) * var
            }
            Dist::Joint(_) => f64::NAN,
        }
    }

    /// Variance; transformed elements use the delta method.
    pub fn variance(&self) -> f64 {
        match self {
            Dist::Normal { sd, .. } => sd * sd,
            Dist::Degenerate(_) => 0.0,
            Dist::Sample(draws) => stats::variance(draws),
            Dist::Transformed(inner, t) => {
                let d = first_derivative(|x| t.inverse(x), inner.mean());
                d * d * inner.variance()
            }
            Dist::Joint(_) => f64::NAN,
        }
    }

    pub fn median(&self) -> f64 {
        self.quantile(0.5)
    }

    /// Quantile function.
    pub fn quantile(&self, p: f64) -> f64 {
        if !(0.0..=1.0).contains(&p) {
            return f64::NAN;
        }
        match self {
            Dist::Normal { mean, sd } => match Normal::new(*mean, *sd) {
                Ok(n) => n.inverse_cdf(p),
                Err(_) => f64::NAN,
            },
            Dist::Degenerate(x) => *x,
            Dist::Sample(draws) => stats::quantile(draws, p),
            Dist::Transformed(inner, t) => {
                if inverse_is_increasing(inner, t) {
                    t.inverse(inner.quantile(p))
                } else {
                    t.inverse(inner.quantile(1.0 - p))
                }
            }
            Dist::Joint(_) => f64::NAN,
        }
    }

    /// Cumulative probability at `x`.
    pub fn cdf(&self, x: f64) -> f64 {
        match self {
            Dist::Normal { mean, sd } => match Normal::new(*mean, *sd) {
                Ok(n) => n.cdf(x),
                Err(_) => f64::NAN,
            },
            Dist::Degenerate(v) => {
                if x >= *v {
                    1.0
                } else {
                    0.0
                }
            }
            Dist::Sample(draws) => stats::ecdf(draws, x),
            Dist::Transformed(inner, t) => {
                let p = inner.cdf(t.forward(x));
                if inverse_is_increasing(inner, t) {
                    p
                } else {
                    1.0 - p
                }
            }
            Dist::Joint(_) => f64::NAN,
        }
    }

    /// Probability density at `x`.
    ///
    /// Sample elements use a Gaussian kernel density estimate.
    pub fn density(&self, x: f64) -> f64 {
        match self {
            Dist::Normal { mean, sd } => match Normal::new(*mean, *sd) {
                Ok(n) => n.pdf(x),
                Err(_) => f64::NAN,
            },
            Dist::Degenerate(_) => f64::NAN,
            Dist::Sample(draws) => kernel_density(draws, x),
            Dist::Transformed(inner, t) => {
                let jacobian = first_derivative(|v| t.forward(v), x).abs();
                inner.density(t.forward(x)) * jacobian
            }
            Dist::Joint(_) => f64::NAN,
        }
    }

    /// Central prediction interval covering `level` (e.g. 0.95).
    pub fn hilo(&self, level: f64) -> (f64, f64) {
        let alpha = (1.0 - level) / 2.0;
        (self.quantile(alpha), self.quantile(1.0 - alpha))
    }

    /// Draw `n` values.
    pub fn sample<R: Rng>(&self, n: usize, rng: &mut R) -> Result<Vec<f64>> {
        match self {
            Dist::Normal { mean, sd } => {
                let normal = Normal::new(*mean, *sd)
                    .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
                Ok((0..n).map(|_| rng.sample(normal)).collect())
            }
            Dist::Degenerate(x) => Ok(vec![*x; n]),
            Dist::Sample(draws) => {
                if draws.is_empty() {
                    return Err(ForecastError::EmptyData);
                }
                Ok((0..n).map(|_| draws[rng.gen_range(0..draws.len())]).collect())
            }
            Dist::Transformed(inner, t) => Ok(inner
                .sample(n, rng)?
                .into_iter()
                .map(|v| t.inverse(v))
                .collect()),
            Dist::Joint(_) => Err(ForecastError::InvalidParameter(
                "sample a joint distribution through its marginals".to_string(),
            )),
        }
    }
}

impl PartialEq for Dist {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Dist::Normal { mean: m1, sd: s1 }, Dist::Normal { mean: m2, sd: s2 }) => {
                m1 == m2 && s1 == s2
            }
            (Dist::Degenerate(a), Dist::Degenerate(b)) => a == b,
            (Dist::Sample(a), Dist::Sample(b)) => a == b,
            (Dist::Transformed(a, t), Dist::Transformed(b, u)) => a == b && t.same_as(u),
            (Dist::Joint(a), Dist::Joint(b)) => a == b,
            _ => false,
        }
    }
}

fn step_for(x: f64) -> f64 {
    1e-4 * x.abs().max(1.0)
}

fn first_derivative(f: impl Fn(f64) -> f64, x: f64) -> f64 {
    let h = step_for(x);
    (f(x + h) - f(x - h)) / (2.0 * h)
}

fn second_derivative(f: impl Fn(f64) -> f64, x: f64) -> f64 {
    let h = step_for(x);
    (f(x + h) - 2.0 * f(x) + f(x - h)) / (h * h)
}

fn inverse_is_increasing(inner: &Dist, t: &BoundTransform) -> bool {
    let m = inner.median();
    let h = step_for(m);
    t.inverse(m + h) >= t.inverse(m - h)
}

fn kernel_density(draws: &[f64], x: f64) -> f64 {
    let n = draws.len();
    if n < 2 {
        return f64::NAN;
    }
    let sorted = stats::sorted(draws);
    let iqr = stats::quantile_sorted(&sorted, 0.75) - stats::quantile_sorted(&sorted, 0.25);
    let sd = stats::std_dev(draws);
    let spread = if iqr > 0.0 { sd.min(iqr / 1.34) } else { sd };
    let bw = 0.9 * spread * (n as f64).powf(-0.2);
    if bw.is_nan() || bw <= 0.0 {
        return f64::NAN;
    }
    let norm = 1.0 / (n as f64 * bw * (2.0 * PI).sqrt());
    draws
        .iter()
        .map(|d| (-0.5 * ((x - d) / bw).powi(2)).exp())
        .sum::<f64>()
        * norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transformation;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn normal_summaries() {
        let d = Dist::normal(10.0, 2.0);
        assert_relative_eq!(d.mean(), 10.0);
        assert_relative_eq!(d.median(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(d.variance(), 4.0);
        assert_relative_eq!(d.cdf(10.0), 0.5, epsilon = 1e-12);
        let (lo, hi) = d.hilo(0.95);
        assert_relative_eq!(lo, 10.0 - 1.959964 * 2.0, epsilon = 1e-4);
        assert_relative_eq!(hi, 10.0 + 1.959964 * 2.0, epsilon = 1e-4);
    }

    #[test]
    fn zero_sd_collapses() {
        assert_eq!(Dist::normal(3.0, 0.0), Dist::Degenerate(3.0));
        assert_relative_eq!(Dist::Degenerate(3.0).quantile(0.9), 3.0);
    }

    #[test]
    fn sample_summaries() {
        let d = Dist::Sample(vec![1.0, 2.0, 3.0, 4.0, 100.0]);
        assert!(d.is_sample());
        assert_relative_eq!(d.mean(), 22.0);
        assert_relative_eq!(d.median(), 3.0);
        assert!(d.mean() > d.median());
    }

    #[test]
    fn log_normal_view() {
        let t = Transformation::log().bind(None);
        let d = Dist::normal(1.0, 0.5).transformed(t);
        assert_eq!(d.kind(), DistKind::Analytical);

        // exp(mu) * (1 + sigma^2 / 2) to second order
        assert_relative_eq!(d.mean(), 1.0_f64.exp() * 1.125, epsilon = 1e-5);
        assert_relative_eq!(d.median(), 1.0_f64.exp(), epsilon = 1e-9);
        assert_relative_eq!(d.cdf(1.0_f64.exp()), 0.5, epsilon = 1e-9);

        // log-normal density at the median
        let expected = 1.0 / (1.0_f64.exp() * 0.5 * (2.0 * PI).sqrt());
        assert_relative_eq!(d.density(1.0_f64.exp()), expected, epsilon = 1e-6);
    }

    #[test]
    fn decreasing_inverse_flips_quantiles() {
        let t = Transformation::new("negate", |x, _| -x, |y, _| -y).bind(None);
        let d = Dist::normal(0.0, 1.0).transformed(t);
        assert!(d.quantile(0.9) > d.quantile(0.1));
        assert_relative_eq!(d.cdf(d.quantile(0.8)), 0.8, epsilon = 1e-9);
    }

    #[test]
    fn identity_transform_is_not_wrapped() {
        let d = Dist::normal(1.0, 1.0).transformed(BoundTransform::identity());
        assert_eq!(d, Dist::normal(1.0, 1.0));
    }

    #[test]
    fn sampling_is_reproducible() {
        let d = Dist::normal(5.0, 1.0);
        let a = d.sample(10, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = d.sample(10, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);

        let t = Transformation::log().bind(None);
        let draws = d
            .transformed(t)
            .sample(100, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(draws.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn joint_marginals() {
        let d = Dist::Joint(vec![Dist::Sample(vec![1.0, 2.0]), Dist::Sample(vec![3.0])]);
        assert!(d.is_sample());
        assert_eq!(d.dimensions(), 2);
        assert_eq!(d.marginal(1).unwrap(), &Dist::Sample(vec![3.0]));
        assert!(d.marginal(2).is_err());
        assert!(d.mean().is_nan());
        assert!(d.sample(1, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn kernel_density_is_positive_near_data() {
        let d = Dist::Sample((0..200).map(|i| i as f64 / 20.0).collect());
        assert!(d.density(5.0) > 0.05);
        assert!(d.density(1000.0) < 1e-6);
    }
}
