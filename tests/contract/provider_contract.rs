//! Provider contract: every adapter honours the same source semantics.
//!
//! Adapters run against canned payloads, so the suite never touches the
//! network. Each case answers the same questions: series come back sorted
//! and tagged with the requested metric and period, share counts are
//! positive, and a ticker the provider does not know is `Unavailable`
//! rather than an error.

use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use fairval_core::{
    AlphaVantageAdapter, Fetched, FundamentalMetric, FundamentalSource, FundamentalsRequest,
    PriceHistoryRequest, PriceSource, ProviderId, ReportingPeriod, Symbol, YahooAdapter,
};
use serde_json::json;
use time::macros::date;

#[path = "../support/mod.rs"]
mod support;

use support::{
    av_cash_flow, av_earnings, av_overview, yahoo_chart, yahoo_not_found, yahoo_timeseries,
    CannedHttpClient, AV_CASH_FLOW, AV_EARNINGS, AV_OVERVIEW, YAHOO_CHART,
};

struct FundamentalCase {
    id: ProviderId,
    source: Arc<dyn FundamentalSource>,
    unknown: Arc<dyn FundamentalSource>,
}

fn fundamental_cases() -> Vec<FundamentalCase> {
    let yahoo = CannedHttpClient::new()
        .route(
            "type=quarterlyDilutedEPS",
            200,
            yahoo_timeseries(
                "quarterlyDilutedEPS",
                &[("2023-12-31", 2.18), ("2023-06-30", 1.26), ("2023-09-30", 1.46)],
            ),
        )
        .route(
            "type=annualOperatingCashFlow",
            200,
            yahoo_timeseries(
                "annualOperatingCashFlow",
                &[("2022-09-30", 122_151_000_000.0), ("2023-09-30", 110_543_000_000.0)],
            ),
        )
        .route(
            "type=annualOrdinarySharesNumber",
            200,
            yahoo_timeseries("annualOrdinarySharesNumber", &[("2023-09-30", 15_550_061_000.0)]),
        );

    let alphavantage = CannedHttpClient::new()
        .route(
            AV_EARNINGS,
            200,
            av_earnings(
                &[("2023-12-31", "2.18"), ("2023-09-30", "1.46"), ("2023-06-30", "1.26")],
                &[("2023-09-30", "6.13")],
            ),
        )
        .route(
            AV_CASH_FLOW,
            200,
            av_cash_flow(&[("2023-09-30", "110543000000"), ("2022-09-30", "122151000000")]),
        )
        .route(AV_OVERVIEW, 200, av_overview("15550061000"));

    let empty_yahoo = CannedHttpClient::new().route(
        "/ws/fundamentals-timeseries/",
        200,
        json!({ "timeseries": { "result": [], "error": null } }),
    );
    let empty_alphavantage = CannedHttpClient::new()
        .route(AV_EARNINGS, 200, json!({}))
        .route(AV_CASH_FLOW, 200, json!({}))
        .route(AV_OVERVIEW, 200, json!({}));

    vec![
        FundamentalCase {
            id: ProviderId::Yahoo,
            source: Arc::new(YahooAdapter::new(Arc::new(yahoo))),
            unknown: Arc::new(YahooAdapter::new(Arc::new(empty_yahoo))),
        },
        FundamentalCase {
            id: ProviderId::Alphavantage,
            source: Arc::new(AlphaVantageAdapter::new(Arc::new(alphavantage), "demo")),
            unknown: Arc::new(AlphaVantageAdapter::new(Arc::new(empty_alphavantage), "demo")),
        },
    ]
}

fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

#[test]
fn fundamental_sources_report_their_provider() {
    for case in fundamental_cases() {
        assert_eq!(case.source.id(), Some(case.id));
    }
}

#[test]
fn quarterly_eps_is_sorted_and_tagged_for_all_providers() {
    for case in fundamental_cases() {
        let request = FundamentalsRequest::earnings(symbol("AAPL"), ReportingPeriod::Quarterly);
        let series = block_on(case.source.fundamentals(request))
            .unwrap_or_else(|error| panic!("provider '{}' eps failed: {error}", case.id))
            .data()
            .unwrap_or_else(|| panic!("provider '{}': eps should be available", case.id));

        assert_eq!(series.symbol.as_str(), "AAPL", "provider '{}': symbol", case.id);
        assert_eq!(series.metric, FundamentalMetric::EarningsPerShare, "provider '{}'", case.id);
        assert_eq!(series.period, ReportingPeriod::Quarterly, "provider '{}'", case.id);
        assert_eq!(series.len(), 3, "provider '{}': point count", case.id);

        let dates = series.points().iter().map(|point| point.date).collect::<Vec<_>>();
        assert_eq!(
            dates,
            vec![date!(2023 - 06 - 30), date!(2023 - 09 - 30), date!(2023 - 12 - 31)],
            "provider '{}': ascending dates",
            case.id
        );
        assert_eq!(series.latest().map(|point| point.value), Some(2.18));
    }
}

#[test]
fn annual_operating_cash_flow_is_available_for_all_providers() {
    for case in fundamental_cases() {
        let request =
            FundamentalsRequest::operating_cash_flow(symbol("AAPL"), ReportingPeriod::Annual);
        let series = block_on(case.source.fundamentals(request))
            .unwrap_or_else(|error| panic!("provider '{}' ocf failed: {error}", case.id))
            .data()
            .unwrap_or_else(|| panic!("provider '{}': ocf should be available", case.id));

        assert_eq!(series.metric, FundamentalMetric::OperatingCashFlow);
        assert_eq!(series.period, ReportingPeriod::Annual);
        assert_eq!(series.earliest_date(), Some(date!(2022 - 09 - 30)));
        assert!(
            series.points().iter().all(|point| point.value > 0.0),
            "provider '{}': totals are positive",
            case.id
        );
    }
}

#[test]
fn shares_outstanding_is_positive_for_all_providers() {
    for case in fundamental_cases() {
        let shares = block_on(case.source.shares_outstanding(symbol("AAPL")))
            .unwrap_or_else(|error| panic!("provider '{}' shares failed: {error}", case.id));
        assert_eq!(
            shares,
            Fetched::Data(15_550_061_000.0),
            "provider '{}': shares",
            case.id
        );
    }
}

#[test]
fn unknown_ticker_is_unavailable_not_an_error_for_all_providers() {
    for case in fundamental_cases() {
        let request = FundamentalsRequest::earnings(symbol("ZZZZ"), ReportingPeriod::Quarterly);
        let fetched = block_on(case.unknown.fundamentals(request))
            .unwrap_or_else(|error| panic!("provider '{}' must not fail: {error}", case.id));
        assert!(
            matches!(fetched, Fetched::Unavailable { .. }),
            "provider '{}': unknown ticker",
            case.id
        );

        let shares = block_on(case.unknown.shares_outstanding(symbol("ZZZZ")))
            .unwrap_or_else(|error| panic!("provider '{}' must not fail: {error}", case.id));
        assert!(
            matches!(shares, Fetched::Unavailable { .. }),
            "provider '{}': unknown shares",
            case.id
        );
    }
}

#[test]
fn price_history_is_ascending_positive_and_inside_the_window() {
    let client = CannedHttpClient::new().route(
        YAHOO_CHART,
        200,
        yahoo_chart(&[
            (date!(2023 - 12 - 29), 192.53),
            (date!(2024 - 01 - 03), 184.25),
            (date!(2024 - 01 - 02), 185.64),
            (date!(2024 - 02 - 01), 186.86),
        ]),
    );
    let source: Arc<dyn PriceSource> = Arc::new(YahooAdapter::new(Arc::new(client)));
    assert_eq!(source.id(), ProviderId::Yahoo);

    let request = PriceHistoryRequest::new(symbol("AAPL"), date!(2024 - 01 - 01), date!(2024 - 01 - 31))
        .expect("valid request");
    let series = block_on(source.price_history(request))
        .expect("fetch succeeds")
        .data()
        .expect("prices available");

    let dates = series.points().iter().map(|point| point.date).collect::<Vec<_>>();
    assert_eq!(dates, vec![date!(2024 - 01 - 02), date!(2024 - 01 - 03)]);
    assert!(series.points().iter().all(|point| point.close > 0.0));
}

#[test]
fn delisted_ticker_price_history_is_unavailable() {
    let client = CannedHttpClient::new().route(YAHOO_CHART, 404, yahoo_not_found());
    let source = YahooAdapter::new(Arc::new(client));

    let request = PriceHistoryRequest::new(symbol("ZZZZ"), date!(2020 - 01 - 01), date!(2024 - 01 - 01))
        .expect("valid request");
    let fetched = block_on(source.price_history(request)).expect("not a transport failure");

    match fetched {
        Fetched::Unavailable { reason } => assert!(reason.contains("delisted"), "{reason}"),
        Fetched::Data(series) => panic!("expected unavailable, got {} points", series.len()),
    }
}

fn block_on<F>(future: F) -> F::Output
where
    F: Future,
{
    let waker = noop_waker();
    let mut context = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);

    loop {
        match future.as_mut().poll(&mut context) {
            Poll::Ready(output) => return output,
            Poll::Pending => std::thread::yield_now(),
        }
    }
}

fn noop_waker() -> Waker {
    // SAFETY: The vtable functions never dereference the data pointer and are no-op operations.
    unsafe { Waker::from_raw(noop_raw_waker()) }
}

fn noop_raw_waker() -> RawWaker {
    RawWaker::new(std::ptr::null(), &NOOP_RAW_WAKER_VTABLE)
}

unsafe fn noop_raw_waker_clone(_: *const ()) -> RawWaker {
    noop_raw_waker()
}

unsafe fn noop_raw_waker_wake(_: *const ()) {}

unsafe fn noop_raw_waker_wake_by_ref(_: *const ()) {}

unsafe fn noop_raw_waker_drop(_: *const ()) {}

static NOOP_RAW_WAKER_VTABLE: RawWakerVTable = RawWakerVTable::new(
    noop_raw_waker_clone,
    noop_raw_waker_wake,
    noop_raw_waker_wake_by_ref,
    noop_raw_waker_drop,
);
