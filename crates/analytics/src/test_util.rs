use chrono::{Duration, TimeZone, Utc};
use core_types::{Observation, ObservationSeries};

/// Asserts that two `f64` values are equal within an absolute tolerance.
macro_rules! assert_approx {
    ($actual:expr, $expected:expr) => {
        assert_approx!($actual, $expected, 1e-9)
    };
    ($actual:expr, $expected:expr, $tol:expr) => {{
        let (a, e) = ($actual, $expected);
        assert!(
            (a - e).abs() <= $tol,
            "assert_approx failed: actual={a}, expected={e}, diff={}",
            (a - e).abs(),
        );
    }};
}

pub(crate) use assert_approx;

/// Builds a daily series from returns alone; prices are compounded from 100.
pub fn series_from_returns(returns: &[f64]) -> ObservationSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut price = 100.0;
    let observations = returns
        .iter()
        .enumerate()
        .map(|(i, &ret)| {
            price *= 1.0 + ret;
            Observation {
                date: start + Duration::days(i as i64 + 1),
                price,
                volume: 1000.0,
                ret,
            }
        })
        .collect();
    ObservationSeries::new(observations).unwrap()
}
