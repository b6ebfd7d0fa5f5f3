pub mod frame;
pub mod rolling;
pub mod value;

pub use frame::{IndicatorCalculator, IndicatorFrame, IndicatorRow, LONGEST_WINDOW};
pub use rolling::{Ema, RollingWindow};
pub use value::Value;

//synthetic one-second bars from closes for tests
//open = previous close, high/low = max/min(open, close) +/- 1, volume 1000, one trade
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::data::Bar> {
    make_bars_with_volume(closes, &vec![1000.0; closes.len()])
}

#[cfg(test)]
pub fn make_bars_with_volume(closes: &[f64], volumes: &[f64]) -> Vec<crate::data::Bar> {
    use crate::data::Bar;
    use chrono::TimeZone;

    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                base + chrono::Duration::seconds(i as i64),
                "TEST".to_string(),
                open,
                open.max(close) + 1.0,
                (open.min(close) - 1.0).max(0.01),
                close,
                volume,
                1,
            )
        })
        .collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
