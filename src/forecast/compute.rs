//! Raw (model scale) forecast distributions.

use super::options::ForecastOptions;
use crate::core::TimeSeries;
use crate::distribution::Distribution;
use crate::error::{ForecastError, Result};
use crate::models::{row_of, row_positions, FittedModel};
use crate::specials::Stage;
use crate::transform::bind_transformation;
use tracing::debug;

/// Forecast distribution of `model` at each row of `future`, on the scale
/// the model was estimated on.
///
/// With simulation requested the distribution is a per-row sample built
/// from simulated paths; otherwise it is the model's analytical forecast.
pub fn compute_raw(
    model: &FittedModel,
    future: &TimeSeries,
    options: &ForecastOptions,
) -> Result<Distribution> {
    options.interrupt.check()?;
    let dist = if options.uses_simulation() {
        debug!(
            model = model.name(),
            times = options.times,
            bootstrap = options.bootstrap,
            "forecasting from simulated paths"
        );
        simulated(model, future, options)?
    } else {
        debug!(model = model.name(), "forecasting analytically");
        let specials = model
            .evaluate_specials(Stage::Forecast, future, &options.interrupt)
            .map_err(ForecastError::specials)?;
        model.fit().forecast(future, &specials, options.times)?
    };

    if dist.len() != future.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: future.len(),
            got: dist.len(),
        });
    }
    Ok(dist)
}

/// Group simulated response-scale paths by time point, mapped onto the model
/// scale through each row's forward transformation.
fn simulated(
    model: &FittedModel,
    future: &TimeSeries,
    options: &ForecastOptions,
) -> Result<Distribution> {
    let paths = model.generate(future, &options.generate_options(), &options.interrupt)?;
    let binding = bind_transformation(&model.transformation()[0], future)
        .map_err(ForecastError::specials)?;

    let rows = row_positions(future);
    let mut samples: Vec<Vec<f64>> = vec![Vec::with_capacity(options.times); future.len()];
    for (t, _, value) in paths.iter() {
        let row = row_of(&rows, &t)?;
        samples[row].push(binding.for_row(row)?.forward(value));
    }

    if let Some(row) = samples.iter().position(Vec::is_empty) {
        return Err(ForecastError::ComputationError(format!(
            "no simulated values for future row {row}"
        )));
    }
    Ok(Distribution::from_samples(samples))
}
