//! Data source traits and request/response types.
//!
//! Two adapter contracts feed the valuation pipeline:
//!
//! | Trait | Request | Response | Description |
//! |-------|---------|----------|-------------|
//! | [`PriceSource`] | [`PriceHistoryRequest`] | [`PriceSeries`] | Daily close history |
//! | [`FundamentalSource`] | [`FundamentalsRequest`] | [`FundamentalSeries`] | EPS / cash-flow series |
//!
//! Every fetch returns `Result<Fetched<T>, SourceError>`. The two layers keep
//! "the provider has nothing for this ticker" ([`Fetched::Unavailable`])
//! apart from "the call itself failed" ([`SourceError`]), so callers decide
//! explicitly which outcome is terminal.
//!
//! # Example
//!
//! ```rust,ignore
//! use fairval_core::{Fetched, FundamentalSource, FundamentalsRequest, ReportingPeriod, Symbol};
//!
//! async fn eps(source: &dyn FundamentalSource) {
//!     let request = FundamentalsRequest::earnings(Symbol::parse("AAPL")?, ReportingPeriod::Quarterly);
//!     match source.fundamentals(request).await {
//!         Ok(Fetched::Data(series)) => println!("{} points", series.len()),
//!         Ok(Fetched::Unavailable { reason }) => println!("no data: {reason}"),
//!         Err(error) => println!("fetch failed: {error}"),
//!     }
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use time::Date;

use crate::{FundamentalMetric, FundamentalSeries, PriceSeries, ProviderId, ReportingPeriod, Symbol};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    InvalidRequest,
    NotConfigured,
    Internal,
}

/// Structured source error for failed upstream calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
        }
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotConfigured,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::NotConfigured => "source.not_configured",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Outcome of a fetch that reached the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Data(T),
    /// The provider answered but holds no usable data for the request.
    Unavailable { reason: String },
}

impl<T> Fetched<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn data(self) -> Option<T> {
        match self {
            Self::Data(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Data(value) => Fetched::Data(f(value)),
            Self::Unavailable { reason } => Fetched::Unavailable { reason },
        }
    }
}

/// Request payload for daily price history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceHistoryRequest {
    pub symbol: Symbol,
    pub start: Date,
    pub end: Date,
}

impl PriceHistoryRequest {
    pub fn new(symbol: Symbol, start: Date, end: Date) -> Result<Self, SourceError> {
        if start > end {
            return Err(SourceError::invalid_request(format!(
                "price history start {start} is after end {end}"
            )));
        }
        Ok(Self { symbol, start, end })
    }
}

/// Request payload for a fundamental series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundamentalsRequest {
    pub symbol: Symbol,
    pub metric: FundamentalMetric,
    pub period: ReportingPeriod,
}

impl FundamentalsRequest {
    pub fn new(
        symbol: Symbol,
        metric: FundamentalMetric,
        period: ReportingPeriod,
    ) -> Result<Self, SourceError> {
        if metric == FundamentalMetric::SharesOutstanding {
            return Err(SourceError::invalid_request(
                "shares outstanding is a scalar; use FundamentalSource::shares_outstanding",
            ));
        }
        Ok(Self {
            symbol,
            metric,
            period,
        })
    }

    pub fn earnings(symbol: Symbol, period: ReportingPeriod) -> Self {
        Self {
            symbol,
            metric: FundamentalMetric::EarningsPerShare,
            period,
        }
    }

    pub fn operating_cash_flow(symbol: Symbol, period: ReportingPeriod) -> Self {
        Self {
            symbol,
            metric: FundamentalMetric::OperatingCashFlow,
            period,
        }
    }
}

/// Daily price history provider.
pub trait PriceSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Fetches daily closes between the request bounds.
    ///
    /// An unknown ticker is `Fetched::Unavailable`; transport and parse
    /// failures are `SourceError`.
    fn price_history<'a>(
        &'a self,
        req: PriceHistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Fetched<PriceSeries>, SourceError>> + Send + 'a>>;
}

/// Fundamental data provider.
pub trait FundamentalSource: Send + Sync {
    /// Provider behind this source; `None` when no provider is contacted.
    fn id(&self) -> Option<ProviderId>;

    /// Fetches a dated fundamental series.
    ///
    /// Individual malformed records are skipped; the result is
    /// `Fetched::Unavailable` when no record survives.
    fn fundamentals<'a>(
        &'a self,
        req: FundamentalsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Fetched<FundamentalSeries>, SourceError>> + Send + 'a>>;

    /// Fetches the latest shares-outstanding count.
    fn shares_outstanding<'a>(
        &'a self,
        symbol: Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Fetched<f64>, SourceError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn rejects_inverted_price_window() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let err = PriceHistoryRequest::new(symbol, date!(2024 - 02 - 01), date!(2024 - 01 - 01))
            .expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::InvalidRequest);
    }

    #[test]
    fn shares_outstanding_is_not_a_series_request() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let err = FundamentalsRequest::new(
            symbol,
            FundamentalMetric::SharesOutstanding,
            ReportingPeriod::Annual,
        )
        .expect_err("must fail");
        assert_eq!(err.code(), "source.invalid_request");
    }

    #[test]
    fn fetched_map_preserves_unavailable_reason() {
        let fetched: Fetched<u32> = Fetched::unavailable("empty");
        assert_eq!(fetched.map(|v| v + 1), Fetched::unavailable("empty"));
    }
}
