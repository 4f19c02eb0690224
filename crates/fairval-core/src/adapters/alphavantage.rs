use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::{numeric_field, parse_record_date, transport_error};
use crate::data_source::{Fetched, FundamentalSource, FundamentalsRequest, SourceError};
use crate::http_client::{redact_query_param, HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::{
    FundamentalMetric, FundamentalPoint, FundamentalSeries, ProviderId, ReportingPeriod, Symbol,
};

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Keys Alpha Vantage returns in place of data for throttled, premium, or
/// unknown-symbol requests.
const NOTICE_KEYS: [&str; 3] = ["Note", "Information", "Error Message"];

/// Alpha Vantage fundamentals adapter (`EARNINGS`, `CASH_FLOW`, `OVERVIEW`).
#[derive(Clone)]
pub struct AlphaVantageAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    timeout_ms: u64,
}

impl AlphaVantageAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, function: &str, symbol: &Symbol) -> String {
        format!(
            "{}?function={}&symbol={}&apikey={}",
            self.base_url,
            function,
            urlencoding::encode(symbol.as_str()),
            urlencoding::encode(&self.api_key)
        )
    }

    /// Performs one query and returns the decoded body, or the provider
    /// notice when the body carries one instead of data.
    async fn query(&self, function: &str, symbol: &Symbol) -> Result<Fetched<Value>, SourceError> {
        let endpoint = self.endpoint(function, symbol);
        debug!(url = %redact_query_param(&endpoint, "apikey"), "alphavantage request");

        let request = HttpRequest::get(&endpoint).with_timeout_ms(self.timeout_ms);
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| transport_error("alphavantage", &e))?;

        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "alphavantage returned status {}",
                response.status
            )));
        }

        let body: Value = serde_json::from_str(&response.body).map_err(|e| {
            SourceError::internal(format!("failed to parse alphavantage response: {e}"))
        })?;

        for key in NOTICE_KEYS {
            if let Some(notice) = body.get(key).and_then(Value::as_str) {
                return Ok(Fetched::unavailable(format!("alphavantage {function}: {notice}")));
            }
        }

        Ok(Fetched::Data(body))
    }

    async fn fetch_series(
        &self,
        req: &FundamentalsRequest,
    ) -> Result<Fetched<FundamentalSeries>, SourceError> {
        let (function, value_key) = match req.metric {
            FundamentalMetric::EarningsPerShare => ("EARNINGS", "reportedEPS"),
            FundamentalMetric::OperatingCashFlow => ("CASH_FLOW", "operatingCashflow"),
            FundamentalMetric::SharesOutstanding => {
                return Err(SourceError::invalid_request(
                    "shares outstanding is not a dated series",
                ))
            }
        };
        let records_key = records_key(req.metric, req.period);

        let body = match self.query(function, &req.symbol).await? {
            Fetched::Data(body) => body,
            Fetched::Unavailable { reason } => return Ok(Fetched::Unavailable { reason }),
        };

        let Some(records) = body.get(records_key).and_then(Value::as_array) else {
            return Ok(Fetched::unavailable(format!(
                "alphavantage response has no '{records_key}' for {}",
                req.symbol
            )));
        };

        let points = parse_period_records(records, value_key);
        let skipped = records.len() - points.len();
        if skipped > 0 {
            debug!(symbol = %req.symbol, skipped, "skipped malformed alphavantage records");
        }

        if points.is_empty() {
            return Ok(Fetched::unavailable(format!(
                "alphavantage returned no usable {} records for {}",
                req.metric, req.symbol
            )));
        }

        info!(
            symbol = %req.symbol,
            metric = %req.metric,
            period = %req.period,
            points = points.len(),
            "fetched alphavantage fundamentals"
        );

        Ok(Fetched::Data(FundamentalSeries::new(
            req.symbol.clone(),
            req.metric,
            req.period,
            points,
        )))
    }

    async fn fetch_shares_outstanding(&self, symbol: &Symbol) -> Result<Fetched<f64>, SourceError> {
        let body = match self.query("OVERVIEW", symbol).await? {
            Fetched::Data(body) => body,
            Fetched::Unavailable { reason } => return Ok(Fetched::Unavailable { reason }),
        };

        match numeric_field(&body, "SharesOutstanding") {
            Some(shares) if shares > 0.0 => Ok(Fetched::Data(shares)),
            _ => Ok(Fetched::unavailable(format!(
                "alphavantage overview has no shares outstanding for {symbol}"
            ))),
        }
    }
}

impl FundamentalSource for AlphaVantageAdapter {
    fn id(&self) -> Option<ProviderId> {
        Some(ProviderId::Alphavantage)
    }

    fn fundamentals<'a>(
        &'a self,
        req: FundamentalsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Fetched<FundamentalSeries>, SourceError>> + Send + 'a>>
    {
        Box::pin(async move {
            if self.api_key.trim().is_empty() {
                return Err(SourceError::not_configured(
                    "alphavantage api key is not configured",
                ));
            }
            self.fetch_series(&req).await
        })
    }

    fn shares_outstanding<'a>(
        &'a self,
        symbol: Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Fetched<f64>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            if self.api_key.trim().is_empty() {
                return Err(SourceError::not_configured(
                    "alphavantage api key is not configured",
                ));
            }
            self.fetch_shares_outstanding(&symbol).await
        })
    }
}

fn records_key(metric: FundamentalMetric, period: ReportingPeriod) -> &'static str {
    match (metric, period) {
        (FundamentalMetric::EarningsPerShare, ReportingPeriod::Annual) => "annualEarnings",
        (FundamentalMetric::EarningsPerShare, ReportingPeriod::Quarterly) => "quarterlyEarnings",
        (_, ReportingPeriod::Annual) => "annualReports",
        (_, ReportingPeriod::Quarterly) => "quarterlyReports",
    }
}

/// Converts `{fiscalDateEnding, <value_key>}` records, dropping any record
/// with a missing or malformed date or value.
fn parse_period_records(records: &[Value], value_key: &str) -> Vec<FundamentalPoint> {
    records
        .iter()
        .filter_map(|record| {
            let date = parse_record_date(record, "fiscalDateEnding")?;
            let value = numeric_field(record, value_key)?;
            FundamentalPoint::new(date, value).ok()
        })
        .collect()
}
