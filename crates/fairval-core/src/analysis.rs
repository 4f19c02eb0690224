//! Price/fundamental statistics.
//!
//! | Function | Output | Description |
//! |----------|--------|-------------|
//! | [`match_ratios`] | [`MatchedRatio`] list | Pairs each fundamental point with the nearest close |
//! | [`historical_multiple`] | [`Multiple`] | Mean ratio, excluding the most recent |
//! | [`trailing_windows`] | [`PeStats`] | Mean ratio over all history, 10y, 5y, 3y |
//! | [`cagr`] | [`Cagr`] | Compound annual growth between two exact closes |

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Date;
use tracing::debug;

use crate::domain::calendar::{days_between, format_date, iso_date, years_before, DAYS_PER_YEAR};
use crate::{FundamentalSeries, Multiple, PriceSeries};

/// Fundamental point paired with the close nearest to its period end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchedRatio {
    /// Fiscal period end of the fundamental value.
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(with = "iso_date")]
    pub price_date: Date,
    pub price: f64,
    pub value: f64,
    pub ratio: f64,
}

/// Match every positive fundamental value to its nearest close.
///
/// Pairs whose price lies more than `max_distance_days` away are skipped.
pub fn match_ratios(
    prices: &PriceSeries,
    fundamentals: &FundamentalSeries,
    max_distance_days: i64,
) -> Vec<MatchedRatio> {
    let mut skipped_non_positive = 0_usize;
    let mut skipped_distant = 0_usize;

    let ratios = fundamentals
        .points()
        .iter()
        .filter_map(|point| {
            if point.value <= 0.0 {
                skipped_non_positive += 1;
                return None;
            }

            let nearest = prices.nearest(point.date)?;
            let distance = days_between(nearest.date, point.date);
            if distance > max_distance_days {
                skipped_distant += 1;
                debug!(
                    period_end = %format_date(point.date),
                    nearest = %format_date(nearest.date),
                    distance,
                    "no close near fundamental date"
                );
                return None;
            }

            Some(MatchedRatio {
                date: point.date,
                price_date: nearest.date,
                price: nearest.close,
                value: point.value,
                ratio: nearest.close / point.value,
            })
        })
        .collect::<Vec<_>>();

    if skipped_non_positive > 0 || skipped_distant > 0 {
        debug!(
            symbol = %fundamentals.symbol,
            matched = ratios.len(),
            skipped_non_positive,
            skipped_distant,
            "matched price/value ratios"
        );
    }

    ratios
}

/// Mean of all ratios except the most recent one.
///
/// `None` when fewer than two ratios exist or the mean is not a valid multiple.
pub fn historical_multiple(ratios: &[MatchedRatio]) -> Option<Multiple> {
    if ratios.len() < 2 {
        return None;
    }

    let mut ordered = ratios.to_vec();
    ordered.sort_by_key(|ratio| ratio.date);
    ordered.pop();

    let mean = ordered.iter().map(|ratio| ratio.ratio).sum::<f64>() / ordered.len() as f64;
    Multiple::new(mean).ok()
}

/// Look-back window for P/E averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingWindow {
    AllHistory,
    TenYears,
    FiveYears,
    ThreeYears,
}

impl TrailingWindow {
    pub const ALL: [Self; 4] = [
        Self::AllHistory,
        Self::TenYears,
        Self::FiveYears,
        Self::ThreeYears,
    ];

    pub const fn years(self) -> Option<i32> {
        match self {
            Self::AllHistory => None,
            Self::TenYears => Some(10),
            Self::FiveYears => Some(5),
            Self::ThreeYears => Some(3),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AllHistory => "All history",
            Self::TenYears => "Last 10 years",
            Self::FiveYears => "Last 5 years",
            Self::ThreeYears => "Last 3 years",
        }
    }
}

/// Mean ratio over one window; `mean` is `None` when the window is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStat {
    pub window: TrailingWindow,
    pub mean: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeStats {
    #[serde(with = "iso_date")]
    pub as_of: Date,
    pub windows: Vec<WindowStat>,
}

impl PeStats {
    pub fn get(&self, window: TrailingWindow) -> Option<&WindowStat> {
        self.windows.iter().find(|stat| stat.window == window)
    }
}

/// Average ratios over overlapping windows ending at `as_of`.
///
/// A ratio belongs to an N-year window when its date is on or after `as_of`
/// minus N calendar years. Ratios dated after `as_of` are ignored.
pub fn trailing_windows(ratios: &[MatchedRatio], as_of: Date) -> PeStats {
    let windows = TrailingWindow::ALL
        .iter()
        .map(|&window| {
            let cutoff = window.years().map(|years| years_before(as_of, years));
            let values = ratios
                .iter()
                .filter(|ratio| ratio.date <= as_of)
                .filter(|ratio| cutoff.map_or(true, |cutoff| ratio.date >= cutoff))
                .map(|ratio| ratio.ratio)
                .collect::<Vec<_>>();

            let count = values.len();
            let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
            WindowStat {
                window,
                mean,
                count,
            }
        })
        .collect();

    PeStats { as_of, windows }
}

/// Errors from the CAGR calculation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("no closing price on {date}")]
    PriceNotFound { date: String },
    #[error("start and end dates are the same")]
    ZeroSpan,
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: String, end: String },
    #[error("closing price on {date} is not positive")]
    NonPositivePrice { date: String },
}

impl StatsError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::PriceNotFound { .. } => "stats.price_not_found",
            Self::ZeroSpan => "stats.zero_span",
            Self::InvertedRange { .. } => "stats.inverted_range",
            Self::NonPositivePrice { .. } => "stats.non_positive_price",
        }
    }
}

/// Compound annual growth between two closes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cagr {
    #[serde(with = "iso_date")]
    pub start: Date,
    #[serde(with = "iso_date")]
    pub end: Date,
    pub start_price: f64,
    pub end_price: f64,
    pub years: f64,
    /// Fractional rate; `0.26` is 26% per year.
    pub rate: f64,
}

/// CAGR between the closes on exactly `start` and `end`.
pub fn cagr(prices: &PriceSeries, start: Date, end: Date) -> Result<Cagr, StatsError> {
    if start > end {
        return Err(StatsError::InvertedRange {
            start: format_date(start),
            end: format_date(end),
        });
    }
    if start == end {
        return Err(StatsError::ZeroSpan);
    }

    let start_price = close_on(prices, start)?;
    let end_price = close_on(prices, end)?;

    let years = days_between(end, start) as f64 / DAYS_PER_YEAR;
    let rate = (end_price / start_price).powf(1.0 / years) - 1.0;

    Ok(Cagr {
        start,
        end,
        start_price,
        end_price,
        years,
        rate,
    })
}

fn close_on(prices: &PriceSeries, date: Date) -> Result<f64, StatsError> {
    let close = prices
        .close_on(date)
        .ok_or_else(|| StatsError::PriceNotFound {
            date: format_date(date),
        })?;
    if close <= 0.0 {
        return Err(StatsError::NonPositivePrice {
            date: format_date(date),
        });
    }
    Ok(close)
}
