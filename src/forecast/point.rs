//! Point forecast summaries extracted from forecast distributions.

use crate::distribution::Distribution;
use crate::error::{ForecastError, Result};
use std::fmt;
use std::sync::Arc;

/// A summary mapping a distribution column to one value per row.
pub type Aggregator = Arc<dyn Fn(&Distribution) -> Result<Vec<f64>> + Send + Sync>;

/// Mean of each row.
pub fn mean(dist: &Distribution) -> Result<Vec<f64>> {
    Ok(dist.mean())
}

/// Median of each row.
pub fn median(dist: &Distribution) -> Result<Vec<f64>> {
    Ok(dist.median())
}

/// Aggregator for the `p` quantile of each row.
pub fn quantile(p: f64) -> Aggregator {
    Arc::new(move |dist: &Distribution| {
        if !(0.0..=1.0).contains(&p) {
            return Err(ForecastError::InvalidParameter(format!(
                "quantile level must lie in [0, 1], got {p}"
            )));
        }
        Ok(dist.quantile(p))
    })
}

/// Ordered named point forecast summaries.
///
/// # Example
///
/// ```
/// use anofox_distcast::forecast::point::{self, PointForecastSpec};
///
/// let spec = PointForecastSpec::new()
///     .with("mean", point::mean)
///     .with_aggregator("q90", point::quantile(0.9));
/// assert_eq!(spec.names(), vec!["mean", "q90"]);
/// ```
#[derive(Clone, Default)]
pub struct PointForecastSpec {
    entries: Vec<(String, Aggregator)>,
}

impl PointForecastSpec {
    /// An empty spec: no point forecast columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// The conventional single `mean` column.
    pub fn mean_only() -> Self {
        Self::new().with("mean", mean)
    }

    pub fn with<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Distribution) -> Result<Vec<f64>> + Send + Sync + 'static,
    {
        self.with_aggregator(name, Arc::new(f))
    }

    pub fn with_aggregator(mut self, name: impl Into<String>, aggregator: Aggregator) -> Self {
        self.entries.push((name.into(), aggregator));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for PointForecastSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Apply every summary in `spec` to `dist`.
///
/// Multivariate distributions are summarised per margin; the resulting
/// columns are named `<summary>_<response>`. Each summary must return
/// exactly one value per row.
pub fn extract_point_forecasts(
    dist: &Distribution,
    spec: &PointForecastSpec,
) -> Result<Vec<(String, Vec<f64>)>> {
    let margins: Vec<(Option<&str>, Distribution)> = if dist.dimnames().len() > 1 {
        dist.dimnames()
            .iter()
            .enumerate()
            .map(|(d, name)| Ok((Some(name.as_str()), dist.marginal(d)?)))
            .collect::<Result<_>>()?
    } else {
        vec![(None, dist.clone())]
    };

    let mut columns = Vec::with_capacity(spec.len() * margins.len());
    for (summary, aggregator) in &spec.entries {
        for (response, margin) in &margins {
            let values = aggregator(margin)?;
            if values.len() != margin.len() {
                return Err(ForecastError::Validation {
                    summary: summary.clone(),
                    expected: margin.len(),
                    got: values.len(),
                });
            }
            let name = match response {
                Some(response) => format!("{summary}_{response}"),
                None => summary.clone(),
            };
            columns.push((name, values));
        }
    }
    Ok(columns)
}
