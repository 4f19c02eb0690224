//! Behavior-driven tests for dashboard user journeys
//!
//! These tests verify WHAT a user can accomplish with one refresh: read the
//! chart, compare fair value against price, and check growth statistics,
//! all delivered in the JSON envelope the CLI prints.

mod support;

use std::sync::Arc;

use fairval_core::{
    AlphaVantageAdapter, DashboardRequest, DateRange, Envelope, EnvelopeMeta, Multiple,
    ProviderId, Symbol, TrailingWindow, ValuationPipeline, YahooAdapter, SCHEMA_VERSION,
};
use serde_json::Value;
use time::macros::date;
use time::Date;

use support::{av_earnings, yahoo_chart, CannedHttpClient, AV_EARNINGS, YAHOO_CHART};

fn closes() -> Vec<(Date, f64)> {
    vec![
        (date!(2019 - 01 - 02), 39.48),
        (date!(2021 - 12 - 31), 177.57),
        (date!(2022 - 12 - 30), 129.93),
        (date!(2023 - 12 - 29), 192.53),
        (date!(2024 - 01 - 31), 184.40),
    ]
}

fn annual_eps() -> Value {
    av_earnings(
        &[],
        &[
            ("2023-12-31", "6.13"),
            ("2022-12-31", "6.11"),
            ("2021-12-31", "5.61"),
        ],
    )
}

fn dashboard() -> (ValuationPipeline, Arc<CannedHttpClient>) {
    let client = Arc::new(
        CannedHttpClient::new()
            .route(AV_EARNINGS, 200, annual_eps())
            .route(YAHOO_CHART, 200, yahoo_chart(&closes())),
    );
    let pipeline = ValuationPipeline::new(
        Arc::new(YahooAdapter::new(client.clone())),
        Arc::new(AlphaVantageAdapter::new(client.clone(), "demo")),
    );
    (pipeline, client)
}

fn request() -> DashboardRequest {
    DashboardRequest::new(Symbol::parse("aapl").expect("valid symbol"), date!(2024 - 01 - 31))
        .with_period(fairval_core::ReportingPeriod::Annual)
}

// =============================================================================
// User Journey: price versus fair value
// =============================================================================

#[tokio::test]
async fn user_can_compare_price_with_fair_value_on_one_chart() {
    // Given: A user looking at AAPL annual EPS
    let (pipeline, _) = dashboard();

    // When: They refresh the dashboard
    let report = pipeline.run(&request()).await.expect("dashboard refresh");

    // Then: The chart shows the solid price line and a dashed fair-value line
    assert_eq!(report.symbol.as_str(), "AAPL");
    assert_eq!(report.chart.title, "AAPL Stock Price vs EPS Fair Value");
    assert_eq!(report.chart.x_label, "Date");
    assert_eq!(report.chart.y_label, "Price ($)");
    let labels = report
        .chart
        .series
        .iter()
        .map(|series| series.label.as_str())
        .collect::<Vec<_>>();
    assert_eq!(labels[0], "Stock Price");
    assert!(labels[1].starts_with("EPS x "));

    // And: The fair-value line ends at the latest fiscal year
    let line = &report.fair_values[0];
    assert_eq!(line.points.last().map(|point| point.date), Some(date!(2023 - 12 - 31)));
}

#[tokio::test]
async fn user_can_try_a_custom_multiple_without_losing_the_estimate() {
    let (pipeline, _) = dashboard();
    let multiple = Multiple::new(30.0).expect("positive multiple");

    let report = pipeline
        .run(&request().with_multiple(multiple))
        .await
        .expect("dashboard refresh");

    assert_eq!(report.fair_values[0].multiple, multiple);
    assert_eq!(report.fair_values[0].label, "EPS x 30 (Fair Value)");
    assert!(report.historical_multiple.is_some());
}

// =============================================================================
// User Journey: statistics
// =============================================================================

#[tokio::test]
async fn user_can_see_trailing_pe_averages() {
    let (pipeline, _) = dashboard();

    let report = pipeline
        .run(&request().with_pe_stats())
        .await
        .expect("dashboard refresh");

    let stats = report.pe_stats.expect("statistics requested");
    let all = stats.get(TrailingWindow::AllHistory).expect("window");
    assert_eq!(all.count, 3);
    assert!(all.mean.is_some_and(|mean| mean > 0.0));
}

#[tokio::test]
async fn user_can_compute_growth_without_fetching_fundamentals() {
    // Given: A user who only wants the growth rate
    let (pipeline, client) = dashboard();
    let range = DateRange::new(date!(2019 - 01 - 02), date!(2024 - 01 - 31)).expect("range");

    // When: They request CAGR on a price-only run
    let report = pipeline
        .run(&request().price_only().with_cagr(range))
        .await
        .expect("growth report");

    // Then: Growth is computed and no fundamentals provider was contacted
    let growth = report.cagr.expect("computable");
    assert!(growth.rate > 0.3 && growth.rate < 0.4, "{}", growth.rate);
    assert!(report.warnings.is_empty());
    assert_eq!(report.source_chain, vec![ProviderId::Yahoo]);
    assert!(client.urls().iter().all(|url| !url.contains(AV_EARNINGS)));
}

// =============================================================================
// User Journey: machine-readable output
// =============================================================================

#[tokio::test]
async fn user_receives_the_report_inside_a_versioned_envelope() {
    // Given: A refreshed dashboard
    let (pipeline, _) = dashboard();
    let report = pipeline
        .run(&request().with_pe_stats())
        .await
        .expect("dashboard refresh");

    // When: The report is wrapped for output
    let meta = EnvelopeMeta::new("req-00000001", report.source_chain.clone(), 12)
        .expect("valid metadata");
    let envelope = Envelope::success(meta, report);
    let json = serde_json::to_value(&envelope).expect("serializable");

    // Then: Consumers find the schema version, sources, and dated series
    assert_eq!(json["meta"]["schema_version"], SCHEMA_VERSION);
    assert_eq!(json["meta"]["source_chain"][0], "alphavantage");
    assert_eq!(json["data"]["as_of"], "2024-01-31");
    assert_eq!(json["data"]["chart"]["series"][1]["style"], "dashed");
    assert_eq!(json["data"]["pe_stats"]["windows"][0]["window"], "all_history");
    assert!(json.get("errors").is_none(), "clean runs omit errors");
}
