use serde::{Deserialize, Serialize};
use time::Date;

use super::calendar::{days_between, iso_date, DateRange};
use crate::{FundamentalMetric, ReportingPeriod, Symbol, ValidationError};

/// Daily close for one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: Date, close: f64) -> Result<Self, ValidationError> {
        validate_non_negative("close", close)?;
        Ok(Self { date, close })
    }
}

/// Close prices for a symbol, ascending by date with one point per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: Symbol,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Sorts by date; when a date repeats the later entry wins.
    pub fn new(symbol: Symbol, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|point| point.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Self {
            symbol,
            points: deduped,
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<Date> {
        self.points.first().map(|point| point.date)
    }

    pub fn last_date(&self) -> Option<Date> {
        self.points.last().map(|point| point.date)
    }

    pub fn span(&self) -> Option<DateRange> {
        Some(DateRange {
            start: self.first_date()?,
            end: self.last_date()?,
        })
    }

    /// Close on exactly `date`, if that day is in the series.
    pub fn close_on(&self, date: Date) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |point| point.date)
            .ok()
            .map(|index| self.points[index].close)
    }

    /// Point with the smallest absolute day distance to `date`.
    ///
    /// On a tie the earlier point wins, which is the first minimum found when
    /// scanning the series in ascending order.
    pub fn nearest(&self, date: Date) -> Option<&PricePoint> {
        let index = self.points.partition_point(|point| point.date < date);
        let before = index.checked_sub(1).and_then(|i| self.points.get(i));
        let after = self.points.get(index);

        match (before, after) {
            (Some(before), Some(after)) => {
                if days_between(before.date, date) <= days_between(after.date, date) {
                    Some(before)
                } else {
                    Some(after)
                }
            }
            (Some(point), None) | (None, Some(point)) => Some(point),
            (None, None) => None,
        }
    }
}

/// One reported fundamental value at a fiscal period end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundamentalPoint {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub value: f64,
}

impl FundamentalPoint {
    pub fn new(date: Date, value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "value" });
        }
        Ok(Self { date, value })
    }
}

/// Fundamental series sorted ascending by period end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSeries {
    pub symbol: Symbol,
    pub metric: FundamentalMetric,
    pub period: ReportingPeriod,
    points: Vec<FundamentalPoint>,
}

impl FundamentalSeries {
    pub fn new(
        symbol: Symbol,
        metric: FundamentalMetric,
        period: ReportingPeriod,
        mut points: Vec<FundamentalPoint>,
    ) -> Self {
        points.sort_by_key(|point| point.date);
        Self {
            symbol,
            metric,
            period,
            points,
        }
    }

    pub fn points(&self) -> &[FundamentalPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn earliest_date(&self) -> Option<Date> {
        self.points.first().map(|point| point.date)
    }

    pub fn latest(&self) -> Option<&FundamentalPoint> {
        self.points.last()
    }

    /// Points dated on or before `date`.
    pub fn through(&self, date: Date) -> Self {
        Self {
            symbol: self.symbol.clone(),
            metric: self.metric,
            period: self.period,
            points: self
                .points
                .iter()
                .copied()
                .filter(|point| point.date <= date)
                .collect(),
        }
    }

    /// Same series with every value mapped through `f`.
    pub fn map_values(&self, metric: FundamentalMetric, f: impl Fn(f64) -> f64) -> Self {
        Self {
            symbol: self.symbol.clone(),
            metric,
            period: self.period,
            points: self
                .points
                .iter()
                .map(|point| FundamentalPoint {
                    date: point.date,
                    value: f(point.value),
                })
                .collect(),
        }
    }
}

/// Fundamental value scaled by a multiple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FairValuePoint {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub value: f64,
}

/// Positive valuation multiple.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Multiple(f64);

impl Multiple {
    /// Applied when neither a user value nor a historical estimate exists.
    pub const DEFAULT: Self = Self(15.0);

    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ValidationError::InvalidMultiple {
                value: value.to_string(),
            });
        }
        Ok(Self(value))
    }

    pub const fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Multiple {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Multiple> for f64 {
    fn from(value: Multiple) -> Self {
        value.0
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
