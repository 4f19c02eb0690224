//! Canned transport and provider payloads shared by the behavior suites.

#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use fairval_core::{HttpClient, HttpError, HttpRequest, HttpResponse};
use serde_json::{json, Value};
use time::Date;

/// HTTP client answering by URL substring; the first matching route wins.
#[derive(Debug, Default)]
pub struct CannedHttpClient {
    routes: Vec<(String, Result<HttpResponse, HttpError>)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl CannedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, needle: &str, status: u16, body: Value) -> Self {
        self.routes.push((
            needle.to_owned(),
            Ok(HttpResponse::with_status(status, body.to_string())),
        ));
        self
    }

    pub fn route_raw(mut self, needle: &str, status: u16, body: &str) -> Self {
        self.routes
            .push((needle.to_owned(), Ok(HttpResponse::with_status(status, body))));
        self
    }

    pub fn fail(mut self, needle: &str, error: HttpError) -> Self {
        self.routes.push((needle.to_owned(), Err(error)));
        self
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }
}

impl HttpClient for CannedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = self
            .routes
            .iter()
            .find(|(needle, _)| request.url.contains(needle.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| Err(HttpError::new(format!("no canned route for {}", request.url))));

        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);

        Box::pin(async move { response })
    }
}

pub const YAHOO_CHART: &str = "/v8/finance/chart/";
pub const AV_EARNINGS: &str = "function=EARNINGS";
pub const AV_CASH_FLOW: &str = "function=CASH_FLOW";
pub const AV_OVERVIEW: &str = "function=OVERVIEW";

/// Yahoo chart body with one 09:30 New York timestamp per close.
pub fn yahoo_chart(closes: &[(Date, f64)]) -> Value {
    let timestamps = closes
        .iter()
        .map(|(date, _)| date.midnight().assume_utc().unix_timestamp() + 14 * 3600 + 30 * 60)
        .collect::<Vec<_>>();
    let close = closes.iter().map(|(_, close)| *close).collect::<Vec<_>>();

    json!({
        "chart": {
            "result": [{
                "meta": { "currency": "USD", "gmtoffset": -18000, "exchangeTimezoneName": "America/New_York" },
                "timestamp": timestamps,
                "indicators": { "quote": [{ "close": close }] }
            }],
            "error": null
        }
    })
}

pub fn yahoo_not_found() -> Value {
    json!({
        "chart": {
            "result": null,
            "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
        }
    })
}

/// Alpha Vantage `EARNINGS` body; values are raw strings as the API sends them.
pub fn av_earnings(quarterly: &[(&str, &str)], annual: &[(&str, &str)]) -> Value {
    let records = |rows: &[(&str, &str)]| {
        rows.iter()
            .map(|(date, eps)| json!({ "fiscalDateEnding": date, "reportedEPS": eps }))
            .collect::<Vec<_>>()
    };
    json!({
        "symbol": "AAPL",
        "annualEarnings": records(annual),
        "quarterlyEarnings": records(quarterly),
    })
}

pub fn av_cash_flow(annual: &[(&str, &str)]) -> Value {
    let reports = annual
        .iter()
        .map(|(date, ocf)| {
            json!({ "fiscalDateEnding": date, "reportedCurrency": "USD", "operatingCashflow": ocf })
        })
        .collect::<Vec<_>>();
    json!({ "symbol": "MSFT", "annualReports": reports, "quarterlyReports": [] })
}

pub fn av_overview(shares: &str) -> Value {
    json!({ "Symbol": "MSFT", "SharesOutstanding": shares })
}

pub fn av_rate_limited() -> Value {
    json!({
        "Information": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."
    })
}

/// Yahoo fundamentals time-series body for one type.
pub fn yahoo_timeseries(series_type: &str, rows: &[(&str, f64)]) -> Value {
    let entries = rows
        .iter()
        .map(|(date, value)| json!({ "asOfDate": date, "reportedValue": { "raw": value } }))
        .collect::<Vec<_>>();
    json!({
        "timeseries": {
            "result": [{ "meta": { "type": [series_type] }, series_type: entries }],
            "error": null
        }
    })
}
