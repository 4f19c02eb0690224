//! Provider adapters.
//!
//! | Adapter | Prices | Fundamentals | Credential |
//! |---------|--------|--------------|------------|
//! | [`YahooAdapter`] | chart API | fundamentals time series | none |
//! | [`AlphaVantageAdapter`] | - | `EARNINGS`, `CASH_FLOW`, `OVERVIEW` | API key |
//! | [`DisabledFundamentals`] | - | always unavailable | none |

mod alphavantage;
mod yahoo;

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use time::Date;

pub use alphavantage::AlphaVantageAdapter;
pub use yahoo::YahooAdapter;

use crate::data_source::{Fetched, FundamentalSource, FundamentalsRequest, SourceError};
use crate::domain::calendar::parse_date;
use crate::http_client::HttpError;
use crate::{FundamentalSeries, ProviderId, Symbol};

/// Fundamental source used when fundamentals are switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledFundamentals;

impl FundamentalSource for DisabledFundamentals {
    fn id(&self) -> Option<ProviderId> {
        None
    }

    fn fundamentals<'a>(
        &'a self,
        req: FundamentalsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Fetched<FundamentalSeries>, SourceError>> + Send + 'a>>
    {
        Box::pin(async move {
            Ok(Fetched::unavailable(format!(
                "fundamentals are disabled; skipped {} for {}",
                req.metric, req.symbol
            )))
        })
    }

    fn shares_outstanding<'a>(
        &'a self,
        symbol: Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Fetched<f64>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            Ok(Fetched::unavailable(format!(
                "fundamentals are disabled; skipped shares outstanding for {symbol}"
            )))
        })
    }
}

/// Reads a finite number stored either as a JSON number or a numeric string.
///
/// Providers use strings such as `"None"` or `"-"` for missing values; those
/// yield `None`.
pub(crate) fn numeric_field(record: &Value, key: &str) -> Option<f64> {
    let value = match record.get(key)? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Transport failures are always `Unavailable`; timeouts are named as such.
pub(crate) fn transport_error(provider: &str, error: &HttpError) -> SourceError {
    if error.timed_out() {
        SourceError::unavailable(format!("{provider} request timed out: {}", error.message()))
    } else {
        SourceError::unavailable(format!("{provider} transport error: {}", error.message()))
    }
}

pub(crate) fn parse_record_date(record: &Value, key: &str) -> Option<Date> {
    record
        .get(key)
        .and_then(Value::as_str)
        .and_then(|raw| parse_date(raw).ok())
}
