//! Fair-value transform.
//!
//! A fair-value line is the fundamental series scaled point by point by a
//! [`Multiple`]. No interpolation or resampling happens; every output date is
//! a fiscal period end from the input series.

use crate::{FairValuePoint, FundamentalSeries, Multiple};

/// Scale each fundamental value by `multiple`.
pub fn fair_value(series: &FundamentalSeries, multiple: Multiple) -> Vec<FairValuePoint> {
    series
        .points()
        .iter()
        .map(|point| FairValuePoint {
            date: point.date,
            value: point.value * multiple.get(),
        })
        .collect()
}

/// Divide an aggregate cash-flow series by the share count.
///
/// Returns `None` when `shares` is not a positive finite number.
pub fn per_share(series: &FundamentalSeries, shares: f64) -> Option<FundamentalSeries> {
    if !shares.is_finite() || shares <= 0.0 {
        return None;
    }
    Some(series.map_values(series.metric, |value| value / shares))
}

/// Label for a fair-value line, e.g. `EPS x 15 (Fair Value)`.
pub fn fair_value_label(metric_label: &str, multiple: Multiple) -> String {
    format!("{metric_label} x {} (Fair Value)", format_multiple(multiple))
}

fn format_multiple(multiple: Multiple) -> String {
    let value = multiple.get();
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        let text = format!("{value:.2}");
        text.trim_end_matches('0').trim_end_matches('.').to_owned()
    }
}
