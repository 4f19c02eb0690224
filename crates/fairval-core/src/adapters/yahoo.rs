use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use time::{Date, OffsetDateTime};
use tracing::{debug, info};

use super::{parse_record_date, transport_error};
use crate::data_source::{
    Fetched, FundamentalSource, FundamentalsRequest, PriceHistoryRequest, PriceSource, SourceError,
};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, DEFAULT_TIMEOUT_MS};
use crate::{
    FundamentalMetric, FundamentalPoint, FundamentalSeries, PricePoint, PriceSeries, ProviderId,
    ReportingPeriod, Symbol,
};

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const TIMESERIES_BASE_URL: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";

/// Lower bound for fundamentals time-series queries (1985-01-01 UTC).
const TIMESERIES_PERIOD_START: i64 = 473_385_600;

/// Yahoo Finance adapter: daily closes from the chart API and keyless
/// fundamentals from the time-series API.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    timeout_ms: u64,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    async fn get(&self, endpoint: &str) -> Result<HttpResponse, SourceError> {
        debug!(url = %endpoint, "yahoo request");
        let request = HttpRequest::get(endpoint)
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout_ms(self.timeout_ms);

        self.http_client
            .execute(request)
            .await
            .map_err(|e| transport_error("yahoo", &e))
    }

    async fn fetch_prices(
        &self,
        req: &PriceHistoryRequest,
    ) -> Result<Fetched<PriceSeries>, SourceError> {
        // period2 is exclusive, so extend it past the requested end day.
        let period1 = unix_midnight(req.start);
        let period2 = unix_midnight(req.end) + 86_400;
        let endpoint = format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=div%2Csplit",
            CHART_BASE_URL,
            urlencoding::encode(req.symbol.as_str()),
            period1,
            period2
        );

        let response = self.get(&endpoint).await?;
        if !response.is_success() && response.status != 404 {
            return Err(SourceError::unavailable(format!(
                "yahoo returned status {}",
                response.status
            )));
        }

        let chart_response: YahooChartResponse = match serde_json::from_str(&response.body) {
            Ok(parsed) => parsed,
            Err(_) if response.status == 404 => {
                return Ok(Fetched::unavailable(format!(
                    "yahoo has no chart for {}",
                    req.symbol
                )))
            }
            Err(e) => {
                return Err(SourceError::internal(format!(
                    "failed to parse yahoo chart: {e}"
                )))
            }
        };

        if let Some(error) = chart_response.chart.error {
            return Ok(Fetched::unavailable(format!(
                "yahoo chart error for {}: {}",
                req.symbol,
                error.describe()
            )));
        }

        let Some(result) = chart_response.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Fetched::unavailable(format!(
                "yahoo chart has no result for {}",
                req.symbol
            )));
        };

        let points = normalize_chart(&result, req.start, req.end);
        if points.is_empty() {
            return Ok(Fetched::unavailable(format!(
                "yahoo returned no closes for {}",
                req.symbol
            )));
        }

        info!(symbol = %req.symbol, points = points.len(), "fetched yahoo price history");
        Ok(Fetched::Data(PriceSeries::new(req.symbol.clone(), points)))
    }

    /// Fetches one time-series type and returns its non-null entries.
    async fn fetch_timeseries(
        &self,
        symbol: &Symbol,
        series_type: &str,
    ) -> Result<Fetched<Vec<FundamentalPoint>>, SourceError> {
        let encoded = urlencoding::encode(symbol.as_str());
        let endpoint = format!(
            "{}/{}?symbol={}&type={}&period1={}&period2={}",
            TIMESERIES_BASE_URL,
            encoded,
            encoded,
            series_type,
            TIMESERIES_PERIOD_START,
            OffsetDateTime::now_utc().unix_timestamp()
        );

        let response = self.get(&endpoint).await?;
        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "yahoo timeseries returned status {}",
                response.status
            )));
        }

        let body: Value = serde_json::from_str(&response.body).map_err(|e| {
            SourceError::internal(format!("failed to parse yahoo timeseries: {e}"))
        })?;

        let Some(entries) = timeseries_entries(&body, series_type) else {
            return Ok(Fetched::unavailable(format!(
                "yahoo timeseries has no '{series_type}' for {symbol}"
            )));
        };

        let points = entries
            .iter()
            .filter_map(|entry| {
                let date = parse_record_date(entry, "asOfDate")?;
                let value = entry
                    .get("reportedValue")
                    .and_then(|reported| reported.get("raw"))
                    .and_then(Value::as_f64)?;
                FundamentalPoint::new(date, value).ok()
            })
            .collect::<Vec<_>>();

        let skipped = entries.len() - points.len();
        if skipped > 0 {
            debug!(%symbol, series_type, skipped, "skipped empty yahoo timeseries entries");
        }

        if points.is_empty() {
            return Ok(Fetched::unavailable(format!(
                "yahoo timeseries '{series_type}' is empty for {symbol}"
            )));
        }

        Ok(Fetched::Data(points))
    }
}

impl PriceSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn price_history<'a>(
        &'a self,
        req: PriceHistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Fetched<PriceSeries>, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_prices(&req).await })
    }
}

impl FundamentalSource for YahooAdapter {
    fn id(&self) -> Option<ProviderId> {
        Some(ProviderId::Yahoo)
    }

    fn fundamentals<'a>(
        &'a self,
        req: FundamentalsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Fetched<FundamentalSeries>, SourceError>> + Send + 'a>>
    {
        Box::pin(async move {
            let series_type = timeseries_type(req.metric, req.period);
            let fetched = self.fetch_timeseries(&req.symbol, series_type).await?;
            if let Fetched::Data(points) = &fetched {
                info!(
                    symbol = %req.symbol,
                    metric = %req.metric,
                    period = %req.period,
                    points = points.len(),
                    "fetched yahoo fundamentals"
                );
            }
            Ok(fetched.map(|points| {
                FundamentalSeries::new(req.symbol.clone(), req.metric, req.period, points)
            }))
        })
    }

    fn shares_outstanding<'a>(
        &'a self,
        symbol: Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Fetched<f64>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let series_type =
                timeseries_type(FundamentalMetric::SharesOutstanding, ReportingPeriod::Annual);
            let fetched = self.fetch_timeseries(&symbol, series_type).await?;

            Ok(match fetched {
                Fetched::Data(points) => points
                    .iter()
                    .max_by_key(|point| point.date)
                    .map(|point| point.value)
                    .filter(|shares| *shares > 0.0)
                    .map_or_else(
                        || Fetched::unavailable(format!("no positive share count for {symbol}")),
                        Fetched::Data,
                    ),
                Fetched::Unavailable { reason } => Fetched::Unavailable { reason },
            })
        })
    }
}

fn timeseries_type(metric: FundamentalMetric, period: ReportingPeriod) -> &'static str {
    match (metric, period) {
        (FundamentalMetric::EarningsPerShare, ReportingPeriod::Annual) => "annualDilutedEPS",
        (FundamentalMetric::EarningsPerShare, ReportingPeriod::Quarterly) => "quarterlyDilutedEPS",
        (FundamentalMetric::OperatingCashFlow, ReportingPeriod::Annual) => {
            "annualOperatingCashFlow"
        }
        (FundamentalMetric::OperatingCashFlow, ReportingPeriod::Quarterly) => {
            "quarterlyOperatingCashFlow"
        }
        (FundamentalMetric::SharesOutstanding, ReportingPeriod::Annual) => {
            "annualOrdinarySharesNumber"
        }
        (FundamentalMetric::SharesOutstanding, ReportingPeriod::Quarterly) => {
            "quarterlyOrdinarySharesNumber"
        }
    }
}

/// Locates the entry array for `series_type`; `null` entries are dropped.
fn timeseries_entries<'a>(body: &'a Value, series_type: &str) -> Option<Vec<&'a Value>> {
    let results = body.get("timeseries")?.get("result")?.as_array()?;
    let entries = results
        .iter()
        .find_map(|result| result.get(series_type).and_then(Value::as_array))?;
    Some(entries.iter().filter(|entry| !entry.is_null()).collect())
}

fn unix_midnight(date: Date) -> i64 {
    date.midnight().assume_utc().unix_timestamp()
}

/// Converts chart timestamps into exchange-local calendar dates and pairs
/// them with closes, dropping null closes and dates outside `[start, end]`.
///
/// Dividend- and split-adjusted closes are used when the chart carries them;
/// the raw close fills any gap.
fn normalize_chart(result: &YahooChartResult, start: Date, end: Date) -> Vec<PricePoint> {
    let Some(timestamps) = result.timestamp.as_ref() else {
        return Vec::new();
    };
    let raw = result.indicators.quote.first().map(|quote| &quote.close);
    let adjusted = result.indicators.adjclose.first().map(|adj| &adj.adjclose);
    if raw.is_none() && adjusted.is_none() {
        return Vec::new();
    }
    let close_at = |index: usize| {
        adjusted
            .and_then(|closes| closes.get(index).copied().flatten())
            .or_else(|| raw.and_then(|closes| closes.get(index).copied().flatten()))
    };
    let gmtoffset = result
        .meta
        .as_ref()
        .and_then(|meta| meta.gmtoffset)
        .unwrap_or(0);

    timestamps
        .iter()
        .enumerate()
        .filter_map(|(index, ts)| {
            let close = close_at(index)?;
            let local = OffsetDateTime::from_unix_timestamp(ts + gmtoffset).ok()?;
            let date = local.date();
            if date < start || date > end {
                return None;
            }
            PricePoint::new(date, close).ok()
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl YahooApiError {
    fn describe(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(description)) => format!("{code}: {description}"),
            (Some(text), None) | (None, Some(text)) => text.clone(),
            (None, None) => String::from("unknown error"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
    #[serde(default)]
    adjclose: Vec<YahooChartAdjClose>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}
