//! Price versus fair-value pipeline.
//!
//! One [`ValuationPipeline::run`] call performs the whole dashboard refresh:
//!
//! 1. fetch the fundamental series (plus shares outstanding for cash flow)
//! 2. fetch daily closes from the earliest fundamental date to `as_of`
//! 3. resolve multiples and compute fair-value lines
//! 4. compute the requested statistics
//! 5. assemble the [`ChartModel`]
//!
//! Missing fundamentals degrade the run to a price-only chart with a single
//! warning. A ticker without price history ends the run with
//! [`PipelineError::TickerNotFound`]. Nothing is cached between runs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::macros::date;
use time::Date;
use tracing::{debug, info, warn};

use crate::adapters::{AlphaVantageAdapter, DisabledFundamentals, YahooAdapter};
use crate::analysis::{self, Cagr, PeStats};
use crate::chart::{ChartModel, ChartSeries};
use crate::config::{ConfigError, FairvalConfig};
use crate::data_source::{
    Fetched, FundamentalSource, FundamentalsRequest, PriceHistoryRequest, PriceSource, SourceError,
};
use crate::domain::calendar::{format_date, iso_date};
use crate::http_client::HttpClient;
use crate::valuation::{fair_value, fair_value_label, per_share};
use crate::{
    DateRange, FairValuePoint, FundamentalSeries, FundamentalsSourceKind, Multiple, PriceSeries,
    ProviderId, ReportingPeriod, Symbol, ValidationError, ValuationMethod,
};

/// Terminal pipeline failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("stock data not found for {symbol}: {reason}")]
    TickerNotFound { symbol: Symbol, reason: String },
    #[error("price history fetch failed: {0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::TickerNotFound { .. } => "pipeline.ticker_not_found",
            Self::Source(error) => error.code(),
            Self::Validation(_) => "validation.invalid_request",
        }
    }
}

/// User inputs for one dashboard refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRequest {
    pub symbol: Symbol,
    pub method: ValuationMethod,
    pub period: ReportingPeriod,
    /// Primary multiple; the historical estimate is used when absent.
    pub multiple: Option<Multiple>,
    pub second_multiple: Option<Multiple>,
    pub log_scale: bool,
    pub view: Option<DateRange>,
    pub pe_stats: bool,
    pub cagr_range: Option<DateRange>,
    /// `false` skips the fundamentals fetch entirely (price-only runs).
    pub include_fundamentals: bool,
    pub as_of: Date,
}

impl DashboardRequest {
    pub fn new(symbol: Symbol, as_of: Date) -> Self {
        Self {
            symbol,
            method: ValuationMethod::Earnings,
            period: ReportingPeriod::Quarterly,
            multiple: None,
            second_multiple: None,
            log_scale: false,
            view: None,
            pe_stats: false,
            cagr_range: None,
            include_fundamentals: true,
            as_of,
        }
    }

    pub fn with_method(mut self, method: ValuationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_period(mut self, period: ReportingPeriod) -> Self {
        self.period = period;
        self
    }

    pub fn with_multiple(mut self, multiple: Multiple) -> Self {
        self.multiple = Some(multiple);
        self
    }

    pub fn with_second_multiple(mut self, multiple: Multiple) -> Self {
        self.second_multiple = Some(multiple);
        self
    }

    pub fn with_log_scale(mut self, log_scale: bool) -> Self {
        self.log_scale = log_scale;
        self
    }

    pub fn with_view(mut self, view: DateRange) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_pe_stats(mut self) -> Self {
        self.pe_stats = true;
        self
    }

    pub fn with_cagr(mut self, range: DateRange) -> Self {
        self.cagr_range = Some(range);
        self
    }

    pub fn price_only(mut self) -> Self {
        self.include_fundamentals = false;
        self
    }
}

/// Where an applied multiple came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipleOrigin {
    User,
    Historical,
    Default,
}

/// One dashed fair-value line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairValueLine {
    pub label: String,
    pub multiple: Multiple,
    pub origin: MultipleOrigin,
    pub points: Vec<FairValuePoint>,
}

/// Non-terminal statistic failure carried alongside a successful report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportIssue {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub symbol: Symbol,
    pub method: ValuationMethod,
    pub period: ReportingPeriod,
    #[serde(with = "iso_date")]
    pub as_of: Date,
    pub source_chain: Vec<ProviderId>,
    pub price_points: usize,
    /// Series the fair-value lines were built from; per-share for cash flow.
    pub fundamentals: Option<FundamentalSeries>,
    pub shares_outstanding: Option<f64>,
    pub historical_multiple: Option<Multiple>,
    pub fair_values: Vec<FairValueLine>,
    pub pe_stats: Option<PeStats>,
    pub cagr: Option<Cagr>,
    pub chart: ChartModel,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ReportIssue>,
}

impl DashboardReport {
    pub fn has_fundamentals(&self) -> bool {
        self.fundamentals.is_some()
    }
}

/// Tunables the pipeline reads from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub default_start: Date,
    pub default_multiple: Multiple,
    pub max_match_distance_days: i64,
}

impl PipelineSettings {
    pub fn from_config(config: &FairvalConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            default_start: config.default_start()?,
            default_multiple: config.default_multiple()?,
            max_match_distance_days: i64::from(config.analysis.max_match_distance_days),
        })
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            default_start: date!(2000 - 01 - 01),
            default_multiple: Multiple::DEFAULT,
            max_match_distance_days: 7,
        }
    }
}

/// Pick the fundamentals provider for the configured source kind.
pub fn fundamentals_source(
    config: &FairvalConfig,
    http_client: Arc<dyn HttpClient>,
) -> Arc<dyn FundamentalSource> {
    let timeout_ms = config.http.timeout_ms;
    let alphavantage = |key: &str| {
        Arc::new(
            AlphaVantageAdapter::new(http_client.clone(), key).with_timeout_ms(timeout_ms),
        ) as Arc<dyn FundamentalSource>
    };
    let yahoo = || {
        Arc::new(YahooAdapter::new(http_client.clone()).with_timeout_ms(timeout_ms))
            as Arc<dyn FundamentalSource>
    };

    match (config.fundamentals.source, config.alphavantage_api_key()) {
        (FundamentalsSourceKind::Auto, Some(key)) => alphavantage(key),
        (FundamentalsSourceKind::Auto, None) => yahoo(),
        (FundamentalsSourceKind::Alphavantage, key) => alphavantage(key.unwrap_or_default()),
        (FundamentalsSourceKind::Yahoo, _) => yahoo(),
        (FundamentalsSourceKind::None, _) => Arc::new(DisabledFundamentals),
    }
}

/// Usable fundamentals plus the shares count they were derived with.
struct ResolvedFundamentals {
    series: FundamentalSeries,
    shares: Option<f64>,
}

#[derive(Clone)]
pub struct ValuationPipeline {
    prices: Arc<dyn PriceSource>,
    fundamentals: Arc<dyn FundamentalSource>,
    settings: PipelineSettings,
}

impl ValuationPipeline {
    pub fn new(prices: Arc<dyn PriceSource>, fundamentals: Arc<dyn FundamentalSource>) -> Self {
        Self {
            prices,
            fundamentals,
            settings: PipelineSettings::default(),
        }
    }

    /// Yahoo prices plus the configured fundamentals source over `http_client`.
    pub fn from_config(
        config: &FairvalConfig,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self, ConfigError> {
        let prices = Arc::new(
            YahooAdapter::new(http_client.clone()).with_timeout_ms(config.http.timeout_ms),
        );
        let fundamentals = fundamentals_source(config, http_client);
        Ok(Self::new(prices, fundamentals).with_settings(PipelineSettings::from_config(config)?))
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Providers a run with `include_fundamentals` may contact, in call order.
    pub fn source_chain(&self, include_fundamentals: bool) -> Vec<ProviderId> {
        let mut chain = Vec::with_capacity(2);
        if include_fundamentals {
            chain.extend(self.fundamentals.id());
        }
        let price_id = self.prices.id();
        if !chain.contains(&price_id) {
            chain.push(price_id);
        }
        chain
    }

    pub async fn run(&self, request: &DashboardRequest) -> Result<DashboardReport, PipelineError> {
        info!(
            symbol = %request.symbol,
            method = %request.method,
            period = %request.period,
            as_of = %format_date(request.as_of),
            "running valuation pipeline"
        );

        let mut warnings = Vec::new();
        let resolved = if request.include_fundamentals {
            match self.resolve_fundamentals(request).await {
                Ok(resolved) => Some(resolved),
                Err(reason) => {
                    let warning = format!(
                        "could not retrieve {} data for {}: {reason}; proceeding with stock prices only",
                        request.method.label(),
                        request.symbol
                    );
                    warn!("{warning}");
                    warnings.push(warning);
                    None
                }
            }
        } else {
            None
        };

        let prices = self
            .fetch_prices(request, resolved.as_ref().map(|r| &r.series))
            .await?;

        let ratios = resolved
            .as_ref()
            .map(|resolved| {
                analysis::match_ratios(
                    &prices,
                    &resolved.series,
                    self.settings.max_match_distance_days,
                )
            })
            .unwrap_or_default();
        let historical_multiple = analysis::historical_multiple(&ratios);

        let fair_values = resolved
            .as_ref()
            .map(|resolved| self.fair_value_lines(request, &resolved.series, historical_multiple))
            .unwrap_or_default();

        let pe_stats = (request.pe_stats && resolved.is_some())
            .then(|| analysis::trailing_windows(&ratios, request.as_of));

        let mut issues = Vec::new();
        let cagr = request.cagr_range.and_then(|range| {
            match analysis::cagr(&prices, range.start, range.end) {
                Ok(cagr) => Some(cagr),
                Err(error) => {
                    debug!(error = %error, "cagr unavailable");
                    issues.push(ReportIssue {
                        code: error.code().to_owned(),
                        message: error.to_string(),
                    });
                    None
                }
            }
        });

        let chart = build_chart(request, &prices, &fair_values);

        Ok(DashboardReport {
            symbol: request.symbol.clone(),
            method: request.method,
            period: request.period,
            as_of: request.as_of,
            source_chain: self.source_chain(request.include_fundamentals),
            price_points: prices.len(),
            shares_outstanding: resolved.as_ref().and_then(|resolved| resolved.shares),
            fundamentals: resolved.map(|resolved| resolved.series),
            historical_multiple,
            fair_values,
            pe_stats,
            cagr,
            chart,
            warnings,
            issues,
        })
    }

    /// Fetch the valuation basis; any failure collapses into a reason string.
    async fn resolve_fundamentals(
        &self,
        request: &DashboardRequest,
    ) -> Result<ResolvedFundamentals, String> {
        let fundamentals_request = FundamentalsRequest::new(
            request.symbol.clone(),
            request.method.metric(),
            request.period,
        )
        .map_err(|error| error.to_string())?;

        let series = match self.fundamentals.fundamentals(fundamentals_request).await {
            Ok(Fetched::Data(series)) if !series.is_empty() => series,
            Ok(Fetched::Data(_)) => return Err(String::from("no fundamental records")),
            Ok(Fetched::Unavailable { reason }) => return Err(reason),
            Err(error) => return Err(error.to_string()),
        };
        let series = series.through(request.as_of);
        if series.is_empty() {
            return Err(format!(
                "no fundamental records on or before {}",
                format_date(request.as_of)
            ));
        }

        if !request.method.needs_per_share() {
            return Ok(ResolvedFundamentals {
                series,
                shares: None,
            });
        }

        let shares = match self
            .fundamentals
            .shares_outstanding(request.symbol.clone())
            .await
        {
            Ok(Fetched::Data(shares)) => shares,
            Ok(Fetched::Unavailable { reason }) => {
                return Err(format!("shares outstanding unavailable: {reason}"))
            }
            Err(error) => return Err(format!("shares outstanding unavailable: {error}")),
        };

        let series = per_share(&series, shares)
            .ok_or_else(|| format!("shares outstanding is not positive: {shares}"))?;
        Ok(ResolvedFundamentals {
            series,
            shares: Some(shares),
        })
    }

    async fn fetch_prices(
        &self,
        request: &DashboardRequest,
        fundamentals: Option<&FundamentalSeries>,
    ) -> Result<PriceSeries, PipelineError> {
        let mut start = fundamentals
            .and_then(FundamentalSeries::earliest_date)
            .unwrap_or(self.settings.default_start)
            .min(request.as_of);
        if let Some(range) = request.cagr_range {
            start = start.min(range.start);
        }
        let window = DateRange::new(start, request.as_of)?;

        let price_request =
            PriceHistoryRequest::new(request.symbol.clone(), window.start, window.end)?;
        match self.prices.price_history(price_request).await? {
            Fetched::Data(series) if !series.is_empty() => Ok(series),
            Fetched::Data(_) => Err(PipelineError::TickerNotFound {
                symbol: request.symbol.clone(),
                reason: String::from("no closing prices returned"),
            }),
            Fetched::Unavailable { reason } => Err(PipelineError::TickerNotFound {
                symbol: request.symbol.clone(),
                reason,
            }),
        }
    }

    fn fair_value_lines(
        &self,
        request: &DashboardRequest,
        series: &FundamentalSeries,
        historical: Option<Multiple>,
    ) -> Vec<FairValueLine> {
        let (primary, origin) = match (request.multiple, historical) {
            (Some(multiple), _) => (multiple, MultipleOrigin::User),
            (None, Some(multiple)) => (multiple, MultipleOrigin::Historical),
            (None, None) => (self.settings.default_multiple, MultipleOrigin::Default),
        };

        let mut lines = vec![(primary, origin)];
        if let Some(second) = request.second_multiple {
            lines.push((second, MultipleOrigin::User));
        }

        lines
            .into_iter()
            .map(|(multiple, origin)| FairValueLine {
                label: fair_value_label(request.method.label(), multiple),
                multiple,
                origin,
                points: fair_value(series, multiple),
            })
            .collect()
    }
}

fn build_chart(
    request: &DashboardRequest,
    prices: &PriceSeries,
    fair_values: &[FairValueLine],
) -> ChartModel {
    let title = format!(
        "{} Stock Price vs {} Fair Value",
        request.symbol,
        request.method.label()
    );
    let chart = fair_values.iter().enumerate().fold(
        ChartModel::new(title).with_series(ChartSeries::price(prices)),
        |chart, (index, line)| {
            chart.with_series(ChartSeries::fair_value(&line.label, index, &line.points))
        },
    );

    chart
        .with_log_scale(request.log_scale)
        .with_view(request.view, prices.span())
}
