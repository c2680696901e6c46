//! Innovation sources for simulated forecast paths.
//!
//! Sample paths are driven either by Gaussian innovations with the fitted
//! residual standard deviation, or by fitted residuals resampled with
//! replacement (optionally in contiguous blocks, which preserves short-range
//! autocorrelation).

use crate::error::{ForecastError, Result};
use rand::Rng;
use statrs::distribution::Normal;

/// Where the innovations of a simulated path come from.
#[derive(Debug, Clone)]
pub enum Innovations {
    /// Draws from N(0, sigma).
    Gaussian(Normal),
    /// Fitted residuals resampled with replacement.
    Bootstrap {
        residuals: Vec<f64>,
        block_size: Option<usize>,
    },
}

impl Innovations {
    /// Build an innovation source from fitted residuals.
    ///
    /// NaN residuals (e.g. the first residual of a differenced model) are
    /// ignored.
    pub fn from_residuals(
        residuals: &[f64],
        bootstrap: bool,
        block_size: Option<usize>,
    ) -> Result<Self> {
        let valid: Vec<f64> = residuals.iter().copied().filter(|r| !r.is_nan()).collect();
        if valid.is_empty() {
            return Err(ForecastError::ComputationError(
                "No valid residuals for simulation".to_string(),
            ));
        }

        if bootstrap {
            return Ok(Innovations::Bootstrap {
                residuals: valid,
                block_size,
            });
        }

        let sigma = (valid.iter().map(|r| r * r).sum::<f64>() / valid.len() as f64).sqrt();
        let normal = Normal::new(0.0, sigma.max(f64::MIN_POSITIVE))
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
        Ok(Innovations::Gaussian(normal))
    }

    /// Draw `n` consecutive innovations for one path.
    pub fn draw(&self, n: usize, rng: &mut impl Rng) -> Vec<f64> {
        match self {
            Innovations::Gaussian(normal) => (0..n).map(|_| rng.sample(normal)).collect(),
            Innovations::Bootstrap {
                residuals,
                block_size: Some(bs),
            } => resample_blocks(residuals, *bs, n, rng),
            Innovations::Bootstrap { residuals, .. } => resample_residuals(residuals, n, rng),
        }
    }
}

/// Resample `n` residuals with replacement (residual bootstrap).
pub fn resample_residuals(residuals: &[f64], n: usize, rng: &mut impl Rng) -> Vec<f64> {
    let len = residuals.len();
    (0..n).map(|_| residuals[rng.gen_range(0..len)]).collect()
}

/// Resample `n` values in contiguous blocks (moving block bootstrap).
pub fn resample_blocks(
    residuals: &[f64],
    block_size: usize,
    n: usize,
    rng: &mut impl Rng,
) -> Vec<f64> {
    let len = residuals.len();
    if block_size == 0 || block_size > len {
        return resample_residuals(residuals, n, rng);
    }

    let mut result = Vec::with_capacity(n);
    while result.len() < n {
        let start = rng.gen_range(0..=(len - block_size));
        let take = block_size.min(n - result.len());
        result.extend_from_slice(&residuals[start..start + take]);
    }
    result
}
