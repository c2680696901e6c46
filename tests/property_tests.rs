//! Property-based tests for the forecast pipeline.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated time series data.

use anofox_distcast::core::TimeSeries;
use anofox_distcast::forecast::{compute_raw, forecast, ForecastOptions, Horizon};
use anofox_distcast::models::{FittedModel, Naive};
use anofox_distcast::transform::{boxcox, inv_boxcox, Transformation};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

/// Create a TimeSeries from a vector of values.
fn make_ts(values: &[f64]) -> TimeSeries {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let timestamps: Vec<_> = (0..values.len())
        .map(|i| base + Duration::hours(i as i64))
        .collect();
    TimeSeries::univariate(timestamps, values.to_vec()).unwrap()
}

/// Strategy for generating strictly positive series values.
/// Adds small variation to avoid all-constant series.
fn positive_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(1.0..1000.0_f64, len).prop_map(|mut v| {
            for (i, val) in v.iter_mut().enumerate() {
                *val += (i as f64) * 0.001;
            }
            v
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn horizon_produces_requested_rows(
        values in positive_values_strategy(5, 40),
        h in 0usize..30,
    ) {
        let model = FittedModel::estimate(make_ts(&values), "value", Transformation::identity(), &Naive::new()).unwrap();
        let table = forecast(&model, &ForecastOptions::with_horizon(Horizon::Periods(h))).unwrap();

        prop_assert_eq!(table.len(), h);
        let last = model.data().last_timestamp().unwrap();
        prop_assert!(table.index().iter().all(|t| *t > last));
        prop_assert!(table.index().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn back_transformed_quantiles_are_monotone(
        values in positive_values_strategy(5, 40),
        lambda in -1.0..1.5_f64,
    ) {
        let model = FittedModel::estimate(
            make_ts(&values),
            "value",
            Transformation::box_cox(lambda),
            &Naive::new(),
        ).unwrap();
        let table = forecast(&model, &ForecastOptions::with_horizon(3)).unwrap();

        let lower = table.distribution().quantile(0.1);
        let median = table.distribution().median();
        let upper = table.distribution().quantile(0.9);
        for i in 0..table.len() {
            if lower[i].is_finite() && upper[i].is_finite() {
                prop_assert!(lower[i] <= median[i] + 1e-9);
                prop_assert!(median[i] <= upper[i] + 1e-9);
            }
        }
    }

    #[test]
    fn identity_point_forecast_is_raw_mean(values in positive_values_strategy(3, 30)) {
        let model = FittedModel::estimate(make_ts(&values), "value", Transformation::identity(), &Naive::new()).unwrap();
        let options = ForecastOptions::with_horizon(4);
        let table = forecast(&model, &options).unwrap();

        let future = TimeSeries::index_only(table.index().to_vec()).unwrap();
        let raw = compute_raw(&model, &future, &options).unwrap();
        let raw_mean = raw.mean();
        prop_assert_eq!(table.point("mean").unwrap(), raw_mean.as_slice());
    }

    #[test]
    fn boxcox_inverse_recovers_input(x in 0.01..1000.0_f64, lambda in -1.0..2.0_f64) {
        let back = inv_boxcox(boxcox(x, lambda), lambda);
        prop_assert!((back - x).abs() <= 1e-6 * x.max(1.0));
    }
}
