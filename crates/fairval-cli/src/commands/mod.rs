mod cagr;
mod chart;
mod pe;

use std::sync::Arc;
use std::time::Instant;

use fairval_core::domain::calendar::{self, parse_date};
use fairval_core::{
    DashboardRequest, DateRange, Envelope, EnvelopeError, FairvalConfig, FundamentalsSourceKind,
    PipelineError, ProviderId, ReportIssue, ReportingPeriod, ReqwestHttpClient, Symbol,
    ValidationError, ValuationMethod, ValuationPipeline,
};
use serde_json::Value;
use time::Date;
use tracing::debug;

use crate::cli::{Cli, Command, MethodArg, PeriodArg, SourceSelector, ValuationArgs};
use crate::error::CliError;
use crate::metadata::Metadata;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub source_chain: Vec<ProviderId>,
}

impl CommandResult {
    pub fn ok(data: Value, source_chain: Vec<ProviderId>) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            source_chain,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }
}

/// Everything a command needs besides its own arguments.
pub struct CommandContext {
    pub pipeline: ValuationPipeline,
    pub as_of: Date,
    pub default_period: ReportingPeriod,
}

impl CommandContext {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut config = FairvalConfig::load(cli.config.as_deref())?;
        if let Some(timeout_ms) = cli.timeout_ms {
            config.http.timeout_ms = timeout_ms;
        }
        if let Some(source) = cli.fundamentals_source {
            config.fundamentals.source = to_source_kind(source);
        }
        config.validate()?;
        debug!(?config, "resolved configuration");

        let http_client = Arc::new(ReqwestHttpClient::new(&config.http.user_agent));
        let pipeline = ValuationPipeline::from_config(&config, http_client)?;
        let as_of = match &cli.as_of {
            Some(raw) => parse_date(raw)?,
            None => calendar::today(),
        };

        Ok(Self {
            pipeline,
            as_of,
            default_period: config.fundamentals.period,
        })
    }

    /// Base request shared by the fundamentals-driven commands.
    fn valuation_request(
        &self,
        symbol: &str,
        args: &ValuationArgs,
    ) -> Result<DashboardRequest, ValidationError> {
        let period = args.period.map_or(self.default_period, to_period);
        Ok(DashboardRequest::new(Symbol::parse(symbol)?, self.as_of)
            .with_method(to_method(args.method))
            .with_period(period))
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let context = CommandContext::from_cli(cli)?;
    let started = Instant::now();
    let command_result = execute(&cli.command, &context).await?;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let CommandResult {
        data,
        warnings,
        errors,
        source_chain,
    } = command_result;

    let mut metadata = Metadata::new(source_chain, latency_ms)?;
    for warning in warnings {
        metadata.push_warning(warning);
    }

    let meta = metadata.into_envelope_meta()?;
    Envelope::with_errors(meta, data, errors).map_err(CliError::from)
}

pub async fn execute(
    command: &Command,
    context: &CommandContext,
) -> Result<CommandResult, CliError> {
    match command {
        Command::Chart(args) => chart::run(args, context).await,
        Command::Pe(args) => pe::run(args, context).await,
        Command::Cagr(args) => cagr::run(args, context).await,
    }
}

/// Terminal pipeline failures become envelope errors; bad input stays a
/// validation error.
fn pipeline_failure(
    error: PipelineError,
    source_chain: Vec<ProviderId>,
) -> Result<CommandResult, CliError> {
    match error {
        PipelineError::Validation(error) => Err(error.into()),
        other => {
            let mut envelope_error = EnvelopeError::new(other.code(), other.to_string())?;
            if let Some(&price_source) = source_chain.last() {
                envelope_error = envelope_error.with_source(price_source);
            }
            Ok(CommandResult::ok(Value::Null, source_chain).with_errors(vec![envelope_error]))
        }
    }
}

fn issue_errors(issues: Vec<ReportIssue>) -> Result<Vec<EnvelopeError>, ValidationError> {
    issues
        .into_iter()
        .map(|issue| EnvelopeError::new(issue.code, issue.message))
        .collect()
}

fn parse_range(start: &str, end: &str) -> Result<DateRange, ValidationError> {
    DateRange::new(parse_date(start)?, parse_date(end)?)
}

const fn to_method(method: MethodArg) -> ValuationMethod {
    match method {
        MethodArg::Eps => ValuationMethod::Earnings,
        MethodArg::Ocf => ValuationMethod::OperatingCashFlow,
    }
}

const fn to_period(period: PeriodArg) -> ReportingPeriod {
    match period {
        PeriodArg::Annual => ReportingPeriod::Annual,
        PeriodArg::Quarterly => ReportingPeriod::Quarterly,
    }
}

const fn to_source_kind(source: SourceSelector) -> FundamentalsSourceKind {
    match source {
        SourceSelector::Auto => FundamentalsSourceKind::Auto,
        SourceSelector::Alphavantage => FundamentalsSourceKind::Alphavantage,
        SourceSelector::Yahoo => FundamentalsSourceKind::Yahoo,
        SourceSelector::None => FundamentalsSourceKind::None,
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;

    use fairval_core::{
        DisabledFundamentals, Fetched, PriceHistoryRequest, PricePoint, PriceSeries, PriceSource,
        SourceError,
    };
    use time::macros::date;

    use super::*;
    use crate::cli::{CagrArgs, ChartArgs};
    use clap::Parser;

    /// Price source returning a fixed series, or nothing for `ZZZZ`.
    struct FixedPrices;

    impl PriceSource for FixedPrices {
        fn id(&self) -> ProviderId {
            ProviderId::Yahoo
        }

        fn price_history<'a>(
            &'a self,
            req: PriceHistoryRequest,
        ) -> Pin<Box<dyn Future<Output = Result<Fetched<PriceSeries>, SourceError>> + Send + 'a>>
        {
            Box::pin(async move {
                if req.symbol.as_str() == "ZZZZ" {
                    return Ok(Fetched::unavailable("No data found, symbol may be delisted"));
                }
                let points = [
                    (date!(2020 - 01 - 01), 100.0),
                    (date!(2021 - 06 - 01), 150.0),
                    (date!(2023 - 01 - 01), 200.0),
                ]
                .into_iter()
                .filter(|(date, _)| *date >= req.start && *date <= req.end)
                .map(|(date, close)| PricePoint::new(date, close))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|error| SourceError::internal(error.to_string()))?;
                Ok(Fetched::Data(PriceSeries::new(req.symbol, points)))
            })
        }
    }

    fn context() -> CommandContext {
        CommandContext {
            pipeline: ValuationPipeline::new(Arc::new(FixedPrices), Arc::new(DisabledFundamentals)),
            as_of: date!(2024 - 01 - 01),
            default_period: ReportingPeriod::Quarterly,
        }
    }

    fn chart_args(symbol: &str) -> ChartArgs {
        ChartArgs {
            symbol: symbol.to_owned(),
            valuation: ValuationArgs {
                method: MethodArg::Eps,
                period: None,
            },
            multiple: None,
            second_multiple: None,
            log_scale: false,
            from: None,
            to: None,
            pe_stats: true,
            cagr_start: None,
            cagr_end: None,
        }
    }

    #[tokio::test]
    async fn unknown_ticker_becomes_envelope_error() {
        let result = execute(&Command::Chart(chart_args("ZZZZ")), &context())
            .await
            .expect("not a CLI failure");

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, "pipeline.ticker_not_found");
        assert_eq!(result.data, Value::Null);
    }

    #[tokio::test]
    async fn disabled_fundamentals_warn_once() {
        let result = execute(&Command::Chart(chart_args("AAPL")), &context())
            .await
            .expect("chart should render");

        assert_eq!(result.warnings.len(), 1);
        assert!(result.errors.is_empty());
        assert_eq!(result.data["pe_stats"], Value::Null);
        assert_eq!(result.data["chart"]["series"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn cagr_command_reports_rate() {
        let args = CagrArgs {
            symbol: String::from("aapl"),
            start: String::from("2020-01-01"),
            end: String::from("2023-01-01"),
        };
        let result = execute(&Command::Cagr(args), &context())
            .await
            .expect("cagr should compute");

        assert!(result.warnings.is_empty());
        let rate = result.data["cagr"]["rate"].as_f64().expect("rate");
        assert!((rate - 0.2599).abs() < 5e-4);
    }

    #[tokio::test]
    async fn inverted_cagr_range_is_a_validation_error() {
        let args = CagrArgs {
            symbol: String::from("AAPL"),
            start: String::from("2023-01-01"),
            end: String::from("2020-01-01"),
        };
        let err = execute(&Command::Cagr(args), &context())
            .await
            .err()
            .expect("must fail");
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn missing_cagr_close_is_reported_in_errors() {
        let args = CagrArgs {
            symbol: String::from("AAPL"),
            start: String::from("2020-01-02"),
            end: String::from("2023-01-01"),
        };
        let result = execute(&Command::Cagr(args), &context())
            .await
            .expect("report still renders");

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, "stats.price_not_found");
    }

    #[test]
    fn invalid_config_file_maps_to_config_exit_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fairval.toml");
        std::fs::write(&path, "[http]\ntimeout_ms = 0\n").expect("write config");

        let cli = Cli::try_parse_from([
            "fairval",
            "--config",
            path.to_str().expect("utf-8 path"),
            "pe",
            "AAPL",
        ])
        .expect("arguments should parse");

        let err = CommandContext::from_cli(&cli).err().expect("must fail");
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn cli_flags_override_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fairval.toml");
        std::fs::write(
            &path,
            "[fundamentals]\nsource = \"alphavantage\"\nperiod = \"annual\"\nalphavantage_api_key = \"demo\"\n",
        )
        .expect("write config");

        let cli = Cli::try_parse_from([
            "fairval",
            "--config",
            path.to_str().expect("utf-8 path"),
            "--fundamentals-source",
            "none",
            "--as-of",
            "2024-03-01",
            "pe",
            "AAPL",
        ])
        .expect("arguments should parse");

        let context = CommandContext::from_cli(&cli).expect("valid context");
        assert_eq!(context.as_of, date!(2024 - 03 - 01));
        assert_eq!(context.default_period, ReportingPeriod::Annual);
        assert_eq!(context.pipeline.source_chain(true), vec![ProviderId::Yahoo]);
    }
}
