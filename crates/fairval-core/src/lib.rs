//! Core contracts for fairval.
//!
//! This crate contains:
//! - Canonical price and fundamental series with validation
//! - Provider adapters behind the [`PriceSource`] and [`FundamentalSource`] traits
//! - Fair-value, historical-multiple, trailing P/E, and CAGR math
//! - The [`ValuationPipeline`] that composes them into a [`DashboardReport`]
//! - Response envelope, structured errors, and TOML configuration

pub mod adapters;
pub mod analysis;
pub mod chart;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod pipeline;
pub mod source;
pub mod valuation;

pub use adapters::{AlphaVantageAdapter, DisabledFundamentals, YahooAdapter};
pub use analysis::{
    cagr, historical_multiple, match_ratios, trailing_windows, Cagr, MatchedRatio, PeStats,
    StatsError, TrailingWindow, WindowStat,
};
pub use chart::{ChartModel, ChartPoint, ChartSeries, LineStyle};
pub use config::{ConfigError, FairvalConfig};
pub use data_source::{
    Fetched, FundamentalSource, FundamentalsRequest, PriceHistoryRequest, PriceSource,
    SourceError, SourceErrorKind,
};
pub use domain::{
    DateRange, FairValuePoint, FundamentalMetric, FundamentalPoint, FundamentalSeries, Multiple,
    PricePoint, PriceSeries, ReportingPeriod, Symbol, ValuationMethod,
};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};
pub use error::ValidationError;
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};
pub use pipeline::{
    DashboardReport, DashboardRequest, FairValueLine, MultipleOrigin, PipelineError,
    PipelineSettings, ReportIssue, ValuationPipeline,
};
pub use source::{FundamentalsSourceKind, ProviderId};
pub use valuation::{fair_value, per_share};
