//! # Domain Models
//!
//! Canonical domain types for fairval price and fundamental series.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PricePoint`] / [`PriceSeries`] | Daily closes, ascending by date |
//! | [`FundamentalPoint`] / [`FundamentalSeries`] | EPS, cash flow, or shares per fiscal period end |
//! | [`FairValuePoint`] | Fundamental value scaled by a [`Multiple`] |
//! | [`Symbol`] | Validated, upper-cased ticker |
//! | [`ValuationMethod`] | Earnings or operating-cash-flow basis |
//! | [`ReportingPeriod`] | Annual or quarterly cadence |
//! | [`DateRange`] | Inclusive calendar range |
//!
//! ## Validation
//!
//! Constructors reject non-finite values, negative closes, and non-positive
//! multiples:
//!
//! ```rust
//! use fairval_core::{Multiple, ValidationError};
//!
//! assert!(Multiple::new(15.0).is_ok());
//! assert!(matches!(Multiple::new(0.0), Err(ValidationError::InvalidMultiple { .. })));
//! ```
//!
//! Dates are timezone-naive [`time::Date`] values; providers normalize their
//! timestamps before building series.

pub mod calendar;
mod method;
mod models;
mod symbol;

pub use calendar::DateRange;
pub use method::{FundamentalMetric, ReportingPeriod, ValuationMethod};
pub use models::{
    FairValuePoint, FundamentalPoint, FundamentalSeries, Multiple, PricePoint, PriceSeries,
};
pub use symbol::Symbol;
