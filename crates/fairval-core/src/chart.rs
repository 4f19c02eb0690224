//! Renderer-neutral chart description.
//!
//! The chart overlays the close price (solid) with one or two fair-value
//! lines (dashed). A hosting UI draws it; the CLI serializes it.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::calendar::iso_date;
use crate::{DateRange, FairValuePoint, PriceSeries};

pub const PRICE_LABEL: &str = "Stock Price";
pub const PRICE_COLOR: &str = "blue";
/// Colors for the first and second fair-value lines.
pub const FAIR_VALUE_COLORS: [&str; 2] = ["red", "orange"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub style: LineStyle,
    pub color: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn price(prices: &PriceSeries) -> Self {
        Self {
            label: PRICE_LABEL.to_owned(),
            style: LineStyle::Solid,
            color: PRICE_COLOR.to_owned(),
            points: prices
                .points()
                .iter()
                .map(|point| ChartPoint {
                    date: point.date,
                    value: point.close,
                })
                .collect(),
        }
    }

    /// Dashed fair-value line; `index` picks the color.
    pub fn fair_value(label: impl Into<String>, index: usize, points: &[FairValuePoint]) -> Self {
        let color = FAIR_VALUE_COLORS[index.min(FAIR_VALUE_COLORS.len() - 1)];
        Self {
            label: label.into(),
            style: LineStyle::Dashed,
            color: color.to_owned(),
            points: points
                .iter()
                .map(|point| ChartPoint {
                    date: point.date,
                    value: point.value,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartModel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub log_scale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<DateRange>,
    pub series: Vec<ChartSeries>,
}

impl ChartModel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: String::from("Date"),
            y_label: String::from("Price ($)"),
            log_scale: false,
            view: None,
            series: Vec::new(),
        }
    }

    pub fn with_series(mut self, series: ChartSeries) -> Self {
        self.series.push(series);
        self
    }

    /// Log y axis; non-positive points are dropped from every series.
    pub fn with_log_scale(mut self, log_scale: bool) -> Self {
        self.log_scale = log_scale;
        if log_scale {
            for series in &mut self.series {
                series.points.retain(|point| point.value > 0.0);
            }
        }
        self
    }

    /// Visible x range, clamped to `bounds`; dropped when they do not overlap.
    pub fn with_view(mut self, view: Option<DateRange>, bounds: Option<DateRange>) -> Self {
        self.view = match (view, bounds) {
            (Some(view), Some(bounds)) => view.clamp_to(bounds),
            _ => None,
        };
        self
    }
}
